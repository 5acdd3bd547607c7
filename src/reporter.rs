// src/reporter.rs
// CSV & JSON export of a finished session.

use crate::error::Result;
use crate::organizer::organize;
use crate::transcript::Transcript;
use csv::Writer;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use tracing::info;

pub const CSV_HEADER: [&str; 9] = [
    "type",
    "speaker",
    "content",
    "timestamp",
    "phase",
    "interaction_type",
    "target",
    "speaking_order",
    "personality_type",
];

pub struct Reporter;

impl Reporter {
    /// One row per transcript entry. Missing optional fields are empty cells.
    pub fn write_transcript_csv<W: Write>(transcript: &Transcript, out: W) -> Result<()> {
        let mut wtr = Writer::from_writer(out);
        wtr.write_record(CSV_HEADER)?;

        for entry in transcript {
            let order = entry.speaking_order.map(|o| o.to_string()).unwrap_or_default();
            let row: [&str; 9] = [
                entry.entry_type.as_str(),
                &entry.speaker,
                &entry.content,
                &entry.timestamp,
                entry.phase.as_deref().unwrap_or(""),
                entry.interaction_type.map(|k| k.as_str()).unwrap_or(""),
                entry.target.as_deref().unwrap_or(""),
                &order,
                entry.personality_type.as_deref().unwrap_or(""),
            ];
            wtr.write_record(row)?;
        }

        wtr.flush()?;
        Ok(())
    }

    pub fn transcript_csv(transcript: &Transcript) -> Result<String> {
        let mut buf = Vec::new();
        Self::write_transcript_csv(transcript, &mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    pub fn export_csv(filename: &str, transcript: &Transcript) -> Result<()> {
        Self::write_transcript_csv(transcript, File::create(filename)?)?;
        info!(path = filename, entries = transcript.len(), "transcript CSV exported");
        Ok(())
    }

    /// Pretty JSON of any session bundle.
    pub fn export_json<T: Serialize>(filename: &str, bundle: &T) -> Result<()> {
        let mut file = File::create(filename)?;
        file.write_all(serde_json::to_string_pretty(bundle)?.as_bytes())?;
        info!(path = filename, "session JSON exported");
        Ok(())
    }

    /// Short per-speaker tally, logged once a discussion finishes.
    pub fn log_overview(transcript: &Transcript) {
        let data = organize(transcript);
        info!(
            topic = %data.topic,
            entries = data.transcript_length,
            responses = data.total_exchanges,
            questions = data.questions.len(),
            interactions = data.interactions.len(),
            "discussion overview"
        );
        for p in &data.participants {
            info!(
                participant = %p.name,
                responses = p.speaking_count,
                avg_words = format!("{:.1}", p.avg_words_per_response()),
                "participant contribution"
            );
        }
    }
}
