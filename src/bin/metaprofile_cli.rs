use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use metaprofile_rs::lineage::read_lineage_supports;
use metaprofile_rs::{
    combine_bracken, combine_profiles, extract_level, generate_clade_taxid_map, read_clade_taxid_table,
    read_profile_table, trim_table_lineages, write_biom, write_profile_table, BiomFormat, BiomOptions,
    BrackenColumns, LevelConfig, LineageConfig, MarkerRules, ProfileConfig,
};

/// Parses a `NAME=PATH` sample argument.
fn parse_named_path(s: &str) -> Result<(String, PathBuf), String> {
    match s.split_once('=') {
        Some((name, path)) if !name.is_empty() && !path.is_empty() => {
            Ok((name.to_string(), PathBuf::from(path)))
        }
        _ => Err(format!("expected NAME=PATH, got '{}'", s)),
    }
}

#[cfg(feature = "hdf5")]
const DEFAULT_BIOM_FORMAT: &str = "hdf5";
#[cfg(not(feature = "hdf5"))]
const DEFAULT_BIOM_FORMAT: &str = "json";

#[derive(Parser)]
#[command(name = "metaprofile-rs")]
#[command(version)]
#[command(about = "Reconcile metagenomic profiles against NCBI taxonomy IDs")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Map every marker-database clade to the taxonomy IDs of its accessions
    CladeMap {
        /// Accession -> taxonomy ID lists, later files win
        #[arg(short = 't', long = "taxids", value_name = "FILE", num_args = 1.., required = true)]
        taxids: Vec<PathBuf>,

        /// Marker database info file
        #[arg(short = 'm', long, value_name = "FILE")]
        markers: PathBuf,

        /// NCBI merged.dmp used to replace deprecated IDs
        #[arg(long, value_name = "FILE")]
        merged: Option<PathBuf>,

        #[arg(short = 'o', long, value_name = "FILE")]
        output: PathBuf,
    },

    /// Merge two-column per-sample profiles into one table
    CombineProfiles {
        /// Samples as NAME=PATH
        #[arg(value_name = "NAME=PATH", value_parser = parse_named_path, required = true)]
        samples: Vec<(String, PathBuf)>,

        #[arg(long, default_value = "#")]
        comment_marker: String,

        #[arg(short = 'o', long, value_name = "FILE")]
        output: PathBuf,
    },

    /// Merge Bracken abundance reports into one taxonomy ID table
    CombineBracken {
        /// Reports as NAME=PATH
        #[arg(value_name = "NAME=PATH", value_parser = parse_named_path, required = true)]
        samples: Vec<(String, PathBuf)>,

        #[arg(long, default_value = "taxonomy_id")]
        taxid_column: String,

        #[arg(long, default_value = "new_est_reads")]
        count_column: String,

        #[arg(short = 'o', long, value_name = "FILE")]
        output: PathBuf,
    },

    /// Keep the rows of one rank level, keyed by their last lineage segment
    ExtractLevel {
        #[arg(short = 'i', long, value_name = "FILE")]
        input: PathBuf,

        /// Rank code, e.g. `s` for species
        #[arg(short = 'l', long)]
        level: String,

        /// Separator between ranks in the row labels
        #[arg(long, default_value = "|")]
        delim: String,

        /// Clade table used to translate names into taxonomy IDs
        #[arg(long, value_name = "FILE")]
        clade_table: Option<PathBuf>,

        #[arg(short = 'o', long, value_name = "FILE")]
        output: PathBuf,
    },

    /// Truncate row lineages at their first weakly supported rank
    TrimLineage {
        #[arg(short = 'i', long, value_name = "FILE")]
        input: PathBuf,

        /// Lineage support lists, one lineage per line
        #[arg(short = 's', long, value_name = "FILE")]
        supports: PathBuf,

        #[arg(long, default_value_t = 0.5)]
        min_support: f64,

        #[arg(long, default_value = ";")]
        ranksep: String,

        #[arg(short = 'o', long, value_name = "FILE")]
        output: PathBuf,
    },

    /// Write a table as a sparse BIOM file
    ToBiom {
        #[arg(short = 'i', long, value_name = "FILE")]
        input: PathBuf,

        #[arg(short = 'f', long, default_value = DEFAULT_BIOM_FORMAT, value_parser = ["json", "hdf5"])]
        format: String,

        #[arg(long, default_value = "No Table ID")]
        table_id: String,

        #[arg(long, default_value = "OTU table")]
        table_type: String,

        #[arg(short = 'o', long, value_name = "FILE")]
        output: PathBuf,
    },
}

fn spinner(color: &str, message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
        .template(&format!("{{spinner:.{}}} {{msg}}", color))
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    spinner.set_style(style);
    spinner.set_message(message.to_string());
    spinner
}

fn biom_format(name: &str) -> Result<BiomFormat, Box<dyn Error>> {
    match name {
        "json" => Ok(BiomFormat::Json),
        #[cfg(feature = "hdf5")]
        "hdf5" => Ok(BiomFormat::Hdf5),
        other => Err(format!("BIOM format '{}' is not available in this build", other).into()),
    }
}

fn run(command: Command) -> Result<(), Box<dyn Error>> {
    match command {
        Command::CladeMap { taxids, markers, merged, output } => {
            let spinner = spinner("blue", "Resolving marker clades to taxonomy IDs...");
            let table = generate_clade_taxid_map(
                taxids.as_slice(),
                &markers,
                merged.as_deref(),
                &output,
                &MarkerRules::default(),
            )?;
            spinner.finish_with_message(format!("Wrote {} clades to {}", table.len(), output.display()));
        }
        Command::CombineProfiles { samples, comment_marker, output } => {
            let spinner = spinner("green", "Combining profiles...");
            let table = combine_profiles(samples.as_slice(), &ProfileConfig { comment_marker })?;
            write_profile_table(&output, &table)?;
            spinner.finish_with_message(format!(
                "Combined {} samples into {} features",
                table.n_samples(),
                table.n_features()
            ));
        }
        Command::CombineBracken { samples, taxid_column, count_column, output } => {
            let spinner = spinner("green", "Combining Bracken reports...");
            let columns = BrackenColumns { taxid_column, count_column };
            let table = combine_bracken(samples.as_slice(), &columns)?;
            write_profile_table(&output, &table)?;
            spinner.finish_with_message(format!(
                "Combined {} reports into {} taxa",
                table.n_samples(),
                table.n_features()
            ));
        }
        Command::ExtractLevel { input, level, delim, clade_table, output } => {
            let spinner = spinner("yellow", "Extracting level...");
            let table = read_profile_table(&input)?;
            let dic = match clade_table {
                Some(path) => Some(read_clade_taxid_table(&path)?.translation()),
                None => None,
            };
            let extracted = extract_level(&table, &level, &LevelConfig::with_delim(&delim), dic.as_ref())?;
            write_profile_table(&output, &extracted)?;
            spinner.finish_with_message(format!("Extracted {} taxa at level '{}'", extracted.n_features(), level));
        }
        Command::TrimLineage { input, supports, min_support, ranksep, output } => {
            let spinner = spinner("yellow", "Trimming lineages...");
            let config = LineageConfig { min_support, ranksep, ..LineageConfig::default() };
            let table = read_profile_table(&input)?;
            let supports = read_lineage_supports(&supports)?;
            let trimmed = trim_table_lineages(&table, &supports, &config)?;
            write_profile_table(&output, &trimmed)?;
            spinner.finish_with_message(format!("Kept {} lineages", trimmed.n_features()));
        }
        Command::ToBiom { input, format, table_id, table_type, output } => {
            let spinner = spinner("cyan", "Writing BIOM table...");
            let format = biom_format(&format)?;
            let options = BiomOptions { table_id, table_type, ..BiomOptions::default() };
            let table = read_profile_table(&input)?;
            write_biom(&output, &table, format, &options)?;
            spinner.finish_with_message(format!("Wrote {}", output.display()));
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_path_parsing() {
        assert_eq!(
            parse_named_path("S1=data/s1.txt").unwrap(),
            ("S1".to_string(), PathBuf::from("data/s1.txt"))
        );
        assert!(parse_named_path("data/s1.txt").is_err());
        assert!(parse_named_path("=data/s1.txt").is_err());
    }

    #[cfg(feature = "hdf5")]
    #[test]
    fn test_to_biom_defaults_to_hdf5() {
        let cli = Cli::try_parse_from(["metaprofile-rs", "to-biom", "-i", "in.tsv", "-o", "out.biom"]).unwrap();
        match cli.command {
            Command::ToBiom { format, .. } => {
                assert_eq!(format, "hdf5");
                assert_eq!(biom_format(&format).unwrap(), BiomFormat::Hdf5);
            }
            _ => panic!("expected to-biom"),
        }
    }
}
