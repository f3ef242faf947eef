use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use memmap2::{Mmap, MmapMut};

use crate::error::{HxdError, Result};

/// バッキングストア
///
/// 書き込み可能ならRw、権限がなければRoにフォールバックする。
/// 長さ0のファイルはマップできないのでEmptyで表す。
#[derive(Debug)]
enum Backing {
    Rw(MmapMut),
    Ro(Mmap),
    Empty,
}

/// ファイルへのバイト単位アクセス
///
/// ファイル全体を読み込まず、ランダムアクセスの読み出しと
/// その場書き込み(即時コミット)を提供する。表示の知識は持たない。
#[derive(Debug)]
pub struct ByteSource {
    path: PathBuf,
    backing: Backing,
    read_only: bool,
}

impl ByteSource {
    /// ファイルを開く
    ///
    /// まず読み書きで開き、権限がなければ読み取り専用で開き直す。
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        match OpenOptions::new().read(true).write(true).open(path) {
            Ok(file) => Self::map(path, &file, false),
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                let file = File::open(path).map_err(|e| HxdError::open_failed(path, e))?;
                Self::map(path, &file, true)
            }
            Err(e) => Err(HxdError::open_failed(path, e)),
        }
    }

    fn map(path: &Path, file: &File, read_only: bool) -> Result<Self> {
        let len = file
            .metadata()
            .map_err(|e| HxdError::FileUnreadable { source: e })?
            .len();

        // 長さ0はマップせず空のまま成功させる(呼び出し側がFileZero表示に切り替える)
        let backing = if len == 0 {
            Backing::Empty
        } else if read_only {
            let mmap = unsafe { Mmap::map(file) }.map_err(|e| HxdError::FileUnreadable { source: e })?;
            Backing::Ro(mmap)
        } else {
            let mmap =
                unsafe { MmapMut::map_mut(file) }.map_err(|e| HxdError::FileUnreadable { source: e })?;
            Backing::Rw(mmap)
        };

        Ok(Self {
            path: path.to_path_buf(),
            backing,
            read_only,
        })
    }

    /// ファイル長(バイト)
    pub fn len(&self) -> u64 {
        match &self.backing {
            Backing::Rw(m) => m.len() as u64,
            Backing::Ro(m) => m.len() as u64,
            Backing::Empty => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// ファイル名を取得
    pub fn filename(&self) -> Option<&str> {
        self.path.file_name().and_then(|s| s.to_str())
    }

    fn bytes(&self) -> &[u8] {
        match &self.backing {
            Backing::Rw(m) => m,
            Backing::Ro(m) => m,
            Backing::Empty => &[],
        }
    }

    /// 指定位置のバイトを取得
    pub fn byte_at(&self, offset: u64) -> Option<u8> {
        self.bytes().get(offset as usize).copied()
    }

    /// 範囲読み出し
    ///
    /// EOF近くではcountより短いスライスを返す。範囲外はすべて
    /// ここで切り詰め、ストレージ層には届かない。
    pub fn read_range(&self, offset: u64, count: usize) -> &[u8] {
        let data = self.bytes();
        if offset >= data.len() as u64 {
            return &[];
        }
        let start = offset as usize;
        let end = start.saturating_add(count).min(data.len());
        &data[start..end]
    }

    /// 1バイト書き込み(即時コミット)
    pub fn write_byte(&mut self, offset: u64, value: u8) -> Result<()> {
        let length = self.len();
        if offset >= length {
            return Err(HxdError::PositionOutOfBound { offset, length });
        }

        match &mut self.backing {
            Backing::Rw(m) => {
                m[offset as usize] = value;
                m.flush_range(offset as usize, 1)
                    .map_err(|e| HxdError::DumpCannotWrite { source: e })
            }
            Backing::Ro(_) => Err(HxdError::FileUnauthorized {
                path: self.path.clone(),
            }),
            // 長さ0なのでここには来ない(上のbounds checkで弾かれる)
            Backing::Empty => Err(HxdError::PositionOutOfBound { offset, length }),
        }
    }
}
