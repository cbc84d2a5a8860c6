use clap::{ArgAction, Parser};
use rncslib::{
    error::Result,
    schema::SchemaTable,
    walker::{walk, WalkOptions},
};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "rncs", version, about = "Извлечение биланов RNCS в JSON lines")]
struct Cli {
    /// Корневой каталог обхода
    root: PathBuf,

    /// CSV со схемой кодов liasse (document_type,line_code,m1,m2,m3,m4)
    #[arg(short = 's', long = "schema")]
    schema: Option<PathBuf>,

    /// Выходной файл (по умолчанию stdout)
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Предел вложенности zip
    #[arg(long = "max-nesting", default_value_t = rncslib::archive::MAX_NESTING_DEPTH)]
    max_nesting: usize,

    /// Остановиться после N биланов
    #[arg(long = "limit")]
    limit: Option<usize>,

    /// Включать исходный XML в вывод
    #[arg(long = "with-source")]
    with_source: bool,

    /// Подробнее в лог (-v, -vv)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    // без схемы каждая строка liasse попадёт в report как неизвестная
    let schema = match &cli.schema {
        Some(path) => SchemaTable::from_path(path)?,
        None => SchemaTable::new(),
    };
    log::info!("schema: {} line codes", schema.len());

    let writer: Box<dyn Write> = match cli.output {
        Some(path) => Box::new(File::create(path)?),
        None => Box::new(io::stdout().lock()),
    };
    let mut writer = BufWriter::new(writer);

    let options = WalkOptions {
        max_nesting: cli.max_nesting,
    };
    let bilans = walk(&cli.root, &schema).with_options(options);
    let mut count = 0usize;
    for mut bilan in bilans.take(cli.limit.unwrap_or(usize::MAX)) {
        if !cli.with_source {
            bilan.raw_source.clear();
        }
        serde_json::to_writer(&mut writer, &bilan).map_err(io::Error::from)?;
        writer.write_all(b"\n")?;
        count += 1;
    }
    writer.flush()?;
    log::info!("{count} bilans written");
    Ok(())
}
