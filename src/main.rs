use anyhow::{Context, bail};
use log::info;
use odk_export::{ExportConfig, Exporter, MetaPosition, ResolvedSchema};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::Instant;

const USAGE: &str = "usage: odk-export <survey.json> <instances-dir> [csv|parquet|json] [output]";

fn main() -> anyhow::Result<()> {
    // Setup logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (Some(survey), Some(instances_dir)) = (args.first(), args.get(1)) else {
        bail!(USAGE);
    };
    let format = args.get(2).map_or("csv", String::as_str);
    let output = args.get(3).map(Path::new);

    let start = Instant::now();
    let schema = odk_export::load_schema(Path::new(survey))
        .with_context(|| format!("Failed to load survey {survey}"))?;
    let resolved = ResolvedSchema::resolve(&schema, MetaPosition::Front)
        .with_context(|| format!("Invalid survey {survey}"))?;
    let instances = odk_export::load_instances_parallel(Path::new(instances_dir))
        .with_context(|| format!("Failed to load submissions from {instances_dir}"))?;
    info!(
        "Loaded {} submissions for {} in {:?}",
        instances.len(),
        resolved.id_string(),
        start.elapsed()
    );

    let exporter = Exporter::new(&resolved, ExportConfig::default());
    match format {
        "csv" => match output {
            Some(path) => exporter.write_csv(&instances, BufWriter::new(File::create(path)?))?,
            None => exporter.write_csv(&instances, io::stdout().lock())?,
        },
        "parquet" => {
            let Some(path) = output else {
                bail!("parquet export needs an output path");
            };
            exporter.write_parquet(&instances, File::create(path)?)?;
        }
        "json" => {
            let rows = exporter.to_json_rows(&instances);
            let mut writer: Box<dyn Write> = match output {
                Some(path) => Box::new(BufWriter::new(File::create(path)?)),
                None => Box::new(io::stdout().lock()),
            };
            serde_json::to_writer_pretty(&mut writer, &rows)?;
            writeln!(writer)?;
            writer.flush()?;
        }
        other => bail!("unknown format '{other}'\n{USAGE}"),
    }

    info!("Export finished in {:?}", start.elapsed());
    Ok(())
}
