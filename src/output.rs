use std::io::{self, Write};

use serde::Serialize;

use crate::app::{
    ClearResult, ExportResult, ImportResult, InfoResult, ListResult, ProgressEvent, ProgressSink,
};

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Human,
    Json,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_import(result: &ImportResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_export(result: &ExportResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_list(result: &ListResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_info(result: &InfoResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_clear(result: &ClearResult) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}

/// Plain-text rendering for terminals. Progress goes to stderr.
pub struct HumanOutput;

impl HumanOutput {
    pub fn print_import(result: &ImportResult) -> io::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(
            out,
            "imported {} ({}): {} created, {} relinked, {} taxa in store",
            result.path, result.format, result.created, result.relinked, result.total_taxa
        )?;
        for root in &result.roots {
            writeln!(out, "  root {root}")?;
        }
        Ok(())
    }

    pub fn print_export(result: &ExportResult) -> io::Result<()> {
        let mut out = io::stdout().lock();
        write!(
            out,
            "exported {} to {} ({}): {} clades",
            result.root, result.path, result.format, result.clades
        )?;
        if let Some(rank) = &result.rank {
            write!(out, ", rank {rank}")?;
        }
        writeln!(out)
    }

    pub fn print_list(result: &ListResult) -> io::Result<()> {
        let mut out = io::stdout().lock();
        if result.roots.is_empty() {
            return writeln!(out, "store is empty");
        }
        for entry in &result.roots {
            let rank = entry.rank.as_deref().unwrap_or("-");
            writeln!(
                out,
                "{:<32} {:<12} {:>6}  {}",
                entry.slug, rank, entry.taxa, entry.name
            )?;
        }
        writeln!(out, "{} taxa", result.total_taxa)
    }

    pub fn print_info(result: &InfoResult) -> io::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "{} ({})", result.name, result.slug)?;
        let optional = [
            ("rank", result.rank.as_deref()),
            ("common name", result.common_name.as_deref()),
            ("author", result.author.as_deref()),
            ("distribution", result.distribution.as_deref()),
            ("appeared", result.appearance_date.as_deref()),
            ("body length", result.body_length.as_deref()),
        ];
        for (label, value) in optional {
            if let Some(value) = value {
                writeln!(out, "  {label}: {value}")?;
            }
        }
        if let Some(year) = result.year_of_description {
            writeln!(out, "  described: {year}")?;
        }
        if let Some(branch_length) = result.branch_length {
            writeln!(out, "  branch length: {branch_length}")?;
        }
        if !result.ancestors.is_empty() {
            writeln!(out, "  lineage: {}", result.ancestors.join(" > "))?;
        }
        writeln!(
            out,
            "  children: {} ({} descendants)",
            result.children.len(),
            result.descendants
        )?;
        for child in &result.children {
            writeln!(out, "    {child}")?;
        }
        for record in &result.records {
            write!(out, "  {} {}", record.database, record.record_id)?;
            if let Some(url) = &record.url {
                write!(out, " <{url}>")?;
            }
            writeln!(out)?;
        }
        for point in &result.points {
            writeln!(
                out,
                "  point {}, {} {}",
                point.latitude,
                point.longitude,
                point.place_name.as_deref().unwrap_or("")
            )?;
        }
        for citation in &result.citations {
            writeln!(out, "  cited: {citation}")?;
        }
        Ok(())
    }

    pub fn print_clear(result: &ClearResult) -> io::Result<()> {
        if result.cleared {
            println!("store cleared");
        } else {
            println!("nothing to clear");
        }
        Ok(())
    }
}

impl ProgressSink for HumanOutput {
    fn event(&self, event: ProgressEvent) {
        match event.elapsed {
            Some(elapsed) => eprintln!("{} ({} ms)", event.message, elapsed.as_millis()),
            None => eprintln!("{}", event.message),
        }
    }
}
