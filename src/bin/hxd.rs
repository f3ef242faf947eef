//! hxd - Terminal hex viewer and editor

use std::io::{self, Write as _};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use crossterm::{
    execute,
    style::{Color, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};

use hxd::app::{App, ViewConfig};
use hxd::dump;
use hxd::error::HxdError;
use hxd::render::{self, OffsetMode, RowWidth};

/// Terminal hex viewer and editor
#[derive(Parser, Debug)]
#[command(name = "hxd")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// File to open
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Offset view: h (hex), d (decimal), o (octal)
    #[arg(short = 'v', long = "view", default_value = "h", value_name = "MODE")]
    view: String,

    /// Bytes per row: a number, or "auto" to fit the terminal
    #[arg(short = 'w', long = "width", default_value = "16", value_name = "N")]
    width: String,

    /// Dump the whole file as plain text to <FILE>.hexdmp and exit
    #[arg(long)]
    dump: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(err.code().clamp(0, 255) as u8)
        }
    }
}

fn run(args: Args) -> Result<(), HxdError> {
    let offset_mode =
        OffsetMode::parse(&args.view).ok_or_else(|| HxdError::InvalidOffsetMode {
            arg: args.view.clone(),
        })?;

    let row_width = parse_width(&args.width)?;

    if args.dump {
        let width = match row_width {
            RowWidth::Fixed(n) => n,
            RowWidth::Auto => {
                let (term_width, _) = crossterm::terminal::size().unwrap_or((80, 24));
                render::auto_row_width(term_width, render::offset_width(0, offset_mode))
            }
        };
        println!("Dumping file...");
        let out_path = dump::dump(&args.file, width, offset_mode)?;
        println!("Dumping done: {}", out_path.display());
        return Ok(());
    }

    // エンジン側の失敗(FileNotFound等)はrawモードに入る前に返す
    let app = App::open(
        &args.file,
        ViewConfig {
            offset_mode,
            row_width,
        },
    )?;

    run_interactive(app)
}

/// -w の引数を解釈(1未満と数値以外は拒否)
fn parse_width(arg: &str) -> Result<RowWidth, HxdError> {
    if arg == "auto" {
        return Ok(RowWidth::Auto);
    }
    match arg.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(RowWidth::Fixed(n)),
        _ => Err(HxdError::InvalidWidth {
            arg: arg.to_string(),
        }),
    }
}

fn run_interactive(app: App) -> Result<(), HxdError> {
    // ターミナルの初期化
    // Alternate Screenで元のシェル画面を保全する
    enable_raw_mode().map_err(|_| HxdError::Unknown)?;
    let mut stdout = io::stdout();
    let _ = execute!(stdout, EnterAlternateScreen);
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = match Terminal::new(backend) {
        Ok(t) => t,
        Err(_) => {
            restore_terminal();
            return Err(HxdError::Unknown);
        }
    };

    let result = run_loop(&mut terminal, app);

    // どの経路でも先にターミナルを復帰させてから報告する
    restore_terminal();
    let _ = terminal.show_cursor();

    if let Err(e) = result {
        report_fatal(&e);
        return Err(HxdError::Unknown);
    }
    Ok(())
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut app: App,
) -> anyhow::Result<()> {
    loop {
        terminal.draw(|f| app.draw(f))?;
        app.handle_event()?;

        if app.should_quit() {
            break;
        }
    }
    Ok(())
}

/// ターミナルの後処理(rawモード解除とAlternate Screen離脱)
fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen);
}

/// 致命的エラーの報告(復帰済みの画面に色付きで出す)
fn report_fatal(err: &anyhow::Error) {
    let mut stderr = io::stderr();
    let _ = execute!(
        stderr,
        SetForegroundColor(Color::White),
        SetBackgroundColor(Color::Red)
    );
    let _ = write!(stderr, " !! Fatal error !! ");
    let _ = execute!(stderr, ResetColor);
    let _ = writeln!(stderr);
    eprintln!("{err:#}");
}
