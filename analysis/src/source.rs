//! Telemetry sources.
//!
//! Decoding the demo container itself happens elsewhere; everything here
//! consumes already structured records that end with an explicit
//! end-of-match marker.

use crate::event::{Event, Player};

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MatchHeader {
    pub map: String,
    pub players: Vec<Player>,
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("reading telemetry: {0}")]
    Io(#[from] std::io::Error),
    #[error("decoding record on line {line}: {source}")]
    Decode {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("telemetry does not start with a match header")]
    MissingHeader,
    #[error("unexpected record on line {line}: {what}")]
    Unexpected { line: usize, what: &'static str },
    #[error("telemetry ended without an end-of-match marker")]
    Truncated,
}

pub trait TelemetrySource {
    fn header(&self) -> &MatchHeader;

    /// Yields the next event, or `None` once the end-of-match marker has been
    /// read. Calling it again after that keeps returning `None`.
    fn next_event(&mut self) -> Result<Option<Event>, SourceError>;
}

/// One line of the JSON lines format.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Record {
    Header(MatchHeader),
    Event(Event),
    End,
}

pub struct JsonLinesSource<R> {
    reader: R,
    header: MatchHeader,
    line: usize,
    finished: bool,
    buf: String,
}

impl<R> JsonLinesSource<R>
where
    R: std::io::BufRead,
{
    pub fn new(mut reader: R) -> Result<Self, SourceError> {
        let mut buf = String::new();
        let mut line = 0;

        let header = loop {
            buf.clear();
            if reader.read_line(&mut buf)? == 0 {
                return Err(SourceError::MissingHeader);
            }
            line += 1;

            if buf.trim().is_empty() {
                continue;
            }

            match serde_json::from_str::<Record>(buf.trim())
                .map_err(|source| SourceError::Decode { line, source })?
            {
                Record::Header(header) => break header,
                _ => return Err(SourceError::MissingHeader),
            }
        };

        Ok(Self {
            reader,
            header,
            line,
            finished: false,
            buf,
        })
    }
}

impl<R> TelemetrySource for JsonLinesSource<R>
where
    R: std::io::BufRead,
{
    fn header(&self) -> &MatchHeader {
        &self.header
    }

    fn next_event(&mut self) -> Result<Option<Event>, SourceError> {
        if self.finished {
            return Ok(None);
        }

        loop {
            self.buf.clear();
            if self.reader.read_line(&mut self.buf)? == 0 {
                return Err(SourceError::Truncated);
            }
            self.line += 1;

            let trimmed = self.buf.trim();
            if trimmed.is_empty() {
                continue;
            }

            let line = self.line;
            let record = serde_json::from_str::<Record>(trimmed)
                .map_err(|source| SourceError::Decode { line, source })?;

            return match record {
                Record::Event(event) => Ok(Some(event)),
                Record::End => {
                    self.finished = true;
                    Ok(None)
                }
                Record::Header(_) => Err(SourceError::Unexpected {
                    line,
                    what: "second match header",
                }),
            };
        }
    }
}

/// A fully decoded match held in memory.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Recording {
    pub header: MatchHeader,
    pub events: Vec<Event>,
}

impl Recording {
    pub fn new(header: MatchHeader, events: Vec<Event>) -> Self {
        Self { header, events }
    }

    /// Drains a source until its end-of-match marker.
    pub fn collect<S>(mut source: S) -> Result<Self, SourceError>
    where
        S: TelemetrySource,
    {
        let mut events = Vec::new();
        while let Some(event) = source.next_event()? {
            events.push(event);
        }

        Ok(Self {
            header: source.header().clone(),
            events,
        })
    }

    pub fn source(&self) -> RecordingSource<'_> {
        RecordingSource {
            recording: self,
            position: 0,
        }
    }

    /// Renders the recording in the JSON lines format read by [`JsonLinesSource`].
    pub fn to_json_lines(&self) -> Result<String, serde_json::Error> {
        let mut out = serde_json::to_string(&Record::Header(self.header.clone()))?;
        out.push('\n');
        for event in self.events.iter() {
            out.push_str(&serde_json::to_string(&Record::Event(event.clone()))?);
            out.push('\n');
        }
        out.push_str(&serde_json::to_string(&Record::End)?);
        out.push('\n');
        Ok(out)
    }
}

pub struct RecordingSource<'r> {
    recording: &'r Recording,
    position: usize,
}

impl TelemetrySource for RecordingSource<'_> {
    fn header(&self) -> &MatchHeader {
        &self.recording.header
    }

    fn next_event(&mut self) -> Result<Option<Event>, SourceError> {
        let event = self.recording.events.get(self.position).cloned();
        if event.is_some() {
            self.position += 1;
        }
        Ok(event)
    }
}
