use std::path::PathBuf;

use thiserror::Error;

/// 操作結果のエラー種別
///
/// プロセス終了コードに一対一で対応する(`code`)。Finder系の2つは
/// 検索の結果報告であり、プロセスレベルのエラーとしては扱わない。
#[derive(Error, Debug)]
pub enum HxdError {
    /// ファイルが存在しない
    #[error("Error: File not found.")]
    FileNotFound { path: PathBuf },

    /// ファイルを読み込めない
    #[error("Error: File not readable.")]
    FileUnreadable {
        #[source]
        source: std::io::Error,
    },

    /// アクセス権がない
    #[error("Error: Unauthorized to open file.")]
    FileUnauthorized { path: PathBuf },

    /// 他プロセスが排他的に開いている
    #[error("Error: File already open.")]
    FileAlreadyOpen { path: PathBuf },

    /// 長さ0のファイル(致命的ではない)
    #[error("File is of zero length.")]
    FileZero,

    /// ファイル範囲外の位置指定
    #[error("Error: Position out of bound.")]
    PositionOutOfBound { offset: u64, length: u64 },

    /// ダンプ中に入力を読めなかった
    #[error("Error: Could not read from input.")]
    DumpCannotRead {
        #[source]
        source: std::io::Error,
    },

    /// ダンプ出力(または書き込みの反映)に失敗した
    #[error("Error: Could not write to output.")]
    DumpCannotWrite {
        #[source]
        source: std::io::Error,
    },

    /// -v の引数が不正
    #[error("Invalid parameter for -v : {arg}")]
    InvalidOffsetMode { arg: String },

    /// -w の引数が不正
    #[error("Invalid parameter for -w : {arg}")]
    InvalidWidth { arg: String },

    /// 検索パターンが見つからなかった
    #[error("Not found.")]
    FinderNoResult,

    /// 空の検索パターン
    #[error("Error: Empty search pattern.")]
    FinderEmptyString,

    /// 分類できないエラー
    #[error("Error: Unknown error.")]
    Unknown,
}

/// このクレート共通の Result 型
pub type Result<T> = std::result::Result<T, HxdError>;

impl HxdError {
    /// プロセス終了コード(成功は0)
    pub fn code(&self) -> i32 {
        match self {
            HxdError::FileNotFound { .. } => 1,
            HxdError::FileUnreadable { .. } => 2,
            HxdError::FileUnauthorized { .. } => 3,
            HxdError::FileAlreadyOpen { .. } => 4,
            HxdError::FileZero => 5,
            HxdError::PositionOutOfBound { .. } => 6,
            HxdError::DumpCannotRead { .. } => 7,
            HxdError::DumpCannotWrite { .. } => 8,
            HxdError::InvalidOffsetMode { .. } => 9,
            HxdError::InvalidWidth { .. } => 10,
            HxdError::FinderNoResult => 11,
            HxdError::FinderEmptyString => 12,
            HxdError::Unknown => 255,
        }
    }

    /// ファイルオープン失敗を io::Error から分類する
    pub fn open_failed(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        let path = path.into();

        // ERROR_SHARING_VIOLATION: 排他で開かれているのはWindowsでしか観測できない
        #[cfg(windows)]
        if err.raw_os_error() == Some(32) {
            return HxdError::FileAlreadyOpen { path };
        }

        match err.kind() {
            std::io::ErrorKind::NotFound => HxdError::FileNotFound { path },
            std::io::ErrorKind::PermissionDenied => HxdError::FileUnauthorized { path },
            _ => HxdError::FileUnreadable { source: err },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        let err = HxdError::FileNotFound {
            path: PathBuf::from("/tmp/nope"),
        };
        assert_eq!(err.to_string(), "Error: File not found.");

        assert_eq!(HxdError::FileZero.to_string(), "File is of zero length.");
        assert_eq!(
            HxdError::InvalidOffsetMode { arg: "x".into() }.to_string(),
            "Invalid parameter for -v : x"
        );
    }

    #[test]
    fn exit_codes_are_stable() {
        assert_eq!(
            HxdError::FileNotFound {
                path: PathBuf::new()
            }
            .code(),
            1
        );
        assert_eq!(HxdError::FileZero.code(), 5);
        assert_eq!(
            HxdError::PositionOutOfBound {
                offset: 9,
                length: 5
            }
            .code(),
            6
        );
        assert_eq!(HxdError::FinderNoResult.code(), 11);
        assert_eq!(HxdError::Unknown.code(), 255);
    }

    #[test]
    fn open_failed_classifies_io_kind() {
        let not_found = std::io::Error::new(std::io::ErrorKind::NotFound, "nope");
        assert!(matches!(
            HxdError::open_failed("/tmp/a", not_found),
            HxdError::FileNotFound { .. }
        ));

        let denied = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(matches!(
            HxdError::open_failed("/tmp/a", denied),
            HxdError::FileUnauthorized { .. }
        ));

        let other = std::io::Error::other("boom");
        assert!(matches!(
            HxdError::open_failed("/tmp/a", other),
            HxdError::FileUnreadable { .. }
        ));
    }
}
