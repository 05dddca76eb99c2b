//! Turning a submission record into the text the student reads.
//!
//! `interpret` is total: a malformed or unexpected record still yields a
//! message, it just says what was wrong instead of what the reviewer said.

use std::fmt;

use thiserror::Error;
use tracing::warn;

use crate::review_api::SubmissionRecord;

/// Status code → verdict sentence. The API only ever reports these three.
static VERDICTS: [(&str, &str); 3] = [
    (
        "rejected",
        "Unfortunately, the reviewer found mistakes in your work.",
    ),
    (
        "approved",
        "The reviewer liked everything, you can move on to the next lesson.",
    ),
    ("reviewing", "Your work is being reviewed."),
];

/// Canned sentence for a status code, if the code is known.
pub fn verdict_for(code: &str) -> Option<&'static str> {
    VERDICTS
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, sentence)| *sentence)
}

/// A well-formed record resolved against the verdict table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub homework_name: String,
    pub sentence: &'static str,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Your work \"{}\" has been checked!\n\n{}",
            self.homework_name, self.sentence
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InterpretationAnomaly {
    #[error("submission record has no `homework_name` field")]
    MissingName,
    #[error("submission {name:?} has no `status` field")]
    MissingStatus { name: String },
    #[error("submission {name:?} has unknown status {code:?}")]
    UnknownStatus { name: String, code: String },
}

impl InterpretationAnomaly {
    /// Message sent to the chat in place of a verdict.
    pub fn diagnostic(&self) -> String {
        match self {
            Self::MissingName => "Could not read the homework name from the review API!\n\n\
                 The record has no `homework_name` field."
                .to_string(),
            Self::MissingStatus { name } => format!(
                "Could not read the status of homework \"{}\"!\n\n\
                 The record has no `status` field.",
                name
            ),
            Self::UnknownStatus { name, code } => format!(
                "Homework \"{}\" has an unknown status `{}`!\n\n\
                 The review API may have changed, please check the bot.",
                name, code
            ),
        }
    }
}

pub fn classify(record: &SubmissionRecord) -> Result<Verdict, InterpretationAnomaly> {
    let name = record
        .name
        .as_deref()
        .ok_or(InterpretationAnomaly::MissingName)?;

    let code = record
        .status_code
        .as_deref()
        .ok_or_else(|| InterpretationAnomaly::MissingStatus {
            name: name.to_string(),
        })?;

    let sentence = verdict_for(code).ok_or_else(|| InterpretationAnomaly::UnknownStatus {
        name: name.to_string(),
        code: code.to_string(),
    })?;

    Ok(Verdict {
        homework_name: name.to_string(),
        sentence,
    })
}

/// Message text for a record. Anomalies are logged and described, never raised.
pub fn interpret(record: &SubmissionRecord) -> String {
    match classify(record) {
        Ok(verdict) => verdict.to_string(),
        Err(anomaly) => {
            warn!("Unusable submission record: {}", anomaly);
            anomaly.diagnostic()
        }
    }
}
