use crate::config::FeverConfig;
use crate::error::{FeverError, Result};
use crate::store::Table;
use crate::{fmt_temp, LogRecord, DT_FORMAT};
use chrono::prelude::*;
use std::io::{BufRead, Write};
use tracing::{info, warn};

/// Raw answers for one entry, as typed by the user or given on the command line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryInput {
    pub temperature: String,
    pub feeling: String,
    pub medicine: String,
    pub notes: String,
}

/// Entry values given as flags; `None` means ask for it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryArgs {
    pub temperature: Option<String>,
    pub feeling: Option<String>,
    pub medicine: Option<String>,
    pub notes: Option<String>,
}

fn ask<R: BufRead, W: Write>(reader: &mut R, writer: &mut W, question: &str) -> std::io::Result<String> {
    write!(writer, "{}", question)?;
    writer.flush()?;
    let mut answer = String::new();
    reader.read_line(&mut answer)?;
    Ok(answer.trim().to_string())
}

/// Prompts for every value not already given in `args`.
/// A blank answer skips the optional fields.
pub fn prompt_entry<R: BufRead, W: Write>(
    args: &EntryArgs,
    reader: &mut R,
    writer: &mut W,
) -> std::io::Result<EntryInput> {
    let mut value = |given: &Option<String>, question: &str| -> std::io::Result<String> {
        match given {
            Some(v) => Ok(v.trim().to_string()),
            None => ask(&mut *reader, &mut *writer, question),
        }
    };
    let temperature = value(&args.temperature, "Enter your current temperature (°F): ")?;
    let feeling = value(
        &args.feeling,
        "How are you feeling? (e.g., tired, headache) [Press Enter to skip]: ",
    )?;
    let medicine = value(&args.medicine, "Any medicine taken? [Press Enter to skip]: ")?;
    let notes = value(&args.notes, "Any additional comment? [Press Enter to skip]: ")?;
    Ok(EntryInput {
        temperature,
        feeling,
        medicine,
        notes,
    })
}

/// the only validated field: a finite real number, no bounds
pub fn parse_temperature(raw: &str) -> Result<f64> {
    match raw.trim().parse::<f64>() {
        Ok(t) if t.is_finite() => Ok(t),
        _ => Err(FeverError::InvalidTemperature(raw.to_string())),
    }
}

/// Loads the store, falling back to an empty one when it is absent or unreadable.
fn load_or_fresh(cfg: &FeverConfig) -> Table {
    let path = &cfg.store_path;
    if !path.exists() {
        info!(path = %path.display(), "no store yet, starting a new one");
        return Table::new();
    }
    match Table::read(path) {
        Ok(t) => t,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not read the existing store, starting fresh");
            println!("Error reading existing file {}: {}. Starting fresh.", path.display(), e);
            Table::new()
        }
    }
}

/// Validates the entry, appends it to the store and rewrites the store.
/// Nothing is written when the temperature is invalid.
pub fn record_entry(cfg: &FeverConfig, input: &EntryInput, now: NaiveDateTime) -> Result<LogRecord> {
    let temperature = parse_temperature(&input.temperature)?;
    // the store keeps minutes only
    let timestamp = now.with_second(0).and_then(|d| d.with_nanosecond(0)).unwrap_or(now);
    let record = LogRecord {
        timestamp,
        temperature,
        feeling: input.feeling.trim().to_string(),
        medicine: input.medicine.trim().to_string(),
        notes: input.notes.trim().to_string(),
    };
    let mut table = load_or_fresh(cfg);
    table.push_record(&record);
    table.write(&cfg.store_path)?;
    info!(
        path = %cfg.store_path.display(),
        rows = table.rows.len(),
        temperature = record.temperature,
        "recorded entry"
    );
    Ok(record)
}

/// Interactive record step: prompts on stdin, prints the outcome.
/// Errors are reported and the step is skipped.
pub fn run(cfg: &FeverConfig, args: &EntryArgs) {
    println!("--- New Fever Log Entry ---");
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let input = match prompt_entry(args, &mut stdin.lock(), &mut stdout.lock()) {
        Ok(i) => i,
        Err(e) => {
            println!("could not read the entry: {}", e);
            return;
        }
    };
    match record_entry(cfg, &input, Local::now().naive_local()) {
        Ok(r) => {
            if let Some(band) = cfg.classify(r.temperature) {
                info!(band = %band.label, "reading classified");
            }
            println!(
                "\nLogged {}°F at {} into '{}' successfully.",
                fmt_temp(r.temperature),
                r.timestamp.format(DT_FORMAT),
                cfg.store_path.display()
            );
        }
        Err(e) => println!("{}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parse_temperature_accepts_numbers_only() {
        assert_eq!(parse_temperature("98.6").unwrap(), 98.6);
        assert_eq!(parse_temperature(" 101 ").unwrap(), 101.0);
        assert_eq!(parse_temperature("-3").unwrap(), -3.0);
        assert!(matches!(
            parse_temperature("abc"),
            Err(FeverError::InvalidTemperature(_))
        ));
        assert!(parse_temperature("").is_err());
        assert!(parse_temperature("NaN").is_err());
        assert!(parse_temperature("inf").is_err());
    }

    #[test]
    fn prompt_entry_reads_answers_in_order() {
        let mut reader = Cursor::new("98.6\ntired\n\n  slept badly \n");
        let mut out = Vec::new();
        let input = prompt_entry(&EntryArgs::default(), &mut reader, &mut out).unwrap();
        assert_eq!(
            input,
            EntryInput {
                temperature: "98.6".to_string(),
                feeling: "tired".to_string(),
                medicine: String::new(),
                notes: "slept badly".to_string(),
            }
        );
        let prompts = String::from_utf8(out).unwrap();
        assert!(prompts.starts_with("Enter your current temperature"));
    }

    #[test]
    fn prompt_entry_skips_given_flags() {
        let args = EntryArgs {
            temperature: Some("100.1".to_string()),
            medicine: Some("paracetamol".to_string()),
            ..EntryArgs::default()
        };
        let mut reader = Cursor::new("headache\nnone\n");
        let mut out = Vec::new();
        let input = prompt_entry(&args, &mut reader, &mut out).unwrap();
        assert_eq!(input.temperature, "100.1");
        assert_eq!(input.feeling, "headache");
        assert_eq!(input.medicine, "paracetamol");
        assert_eq!(input.notes, "none");
        assert!(!String::from_utf8(out).unwrap().contains("temperature"));
    }

    #[test]
    fn prompt_entry_at_eof_gives_blank_answers() {
        let mut reader = Cursor::new("");
        let mut out = Vec::new();
        let input = prompt_entry(&EntryArgs::default(), &mut reader, &mut out).unwrap();
        assert_eq!(input, EntryInput::default());
    }
}
