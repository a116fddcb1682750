//! # ffmpeg Progress Parsing
//!
//! Parser incrementale per l'output `-progress pipe:1` di ffmpeg: righe
//! `key=value` che arrivano in chunk arbitrari, anche spezzate a metà.
//!
//! ## Chiavi riconosciute:
//! - `out_time_us` / `out_time_ms`: tempo elaborato in microsecondi
//! - `out_time`: tempo elaborato in formato `H:M:S`
//! - `progress=end`: completamento
//!
//! Tutte le altre chiavi e le righe malformate vengono ignorate.
//!
//! ## Percentuali:
//! - calcolate solo se la durata totale è nota e positiva
//! - limitate a 99.5 finché il job è in esecuzione (100 è riservato al completamento)
//! - monotone: un campione più vecchio non fa mai regredire la percentuale

/// Highest percentage reported while the process is still running.
pub const RUNNING_PERCENT_CAP: f64 = 99.5;

/// Default number of stderr characters kept for failure diagnostics.
pub const DEFAULT_TAIL_CHARS: usize = 6000;

/// One interpreted progress line
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProgressSample {
    Elapsed { ms: f64 },
    Completed,
}

/// What the caller should report after feeding a chunk
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProgressUpdate {
    Running(f64),
    Completed,
}

/// Round to two decimals and clamp into `[0, 100]`; non-finite values map to 0.
pub fn clamp_percent(value: f64) -> f64 {
    if !value.is_finite() || value <= 0.0 {
        return 0.0;
    }
    if value >= 100.0 {
        return 100.0;
    }
    (value * 100.0).round() / 100.0
}

/// Parse `H:M:S` (seconds may be fractional) into milliseconds.
pub fn parse_clock_to_ms(value: &str) -> Option<f64> {
    let parts: Vec<&str> = value.split(':').collect();
    if parts.len() != 3 {
        return None;
    }
    let mut fields = [0.0_f64; 3];
    for (field, part) in fields.iter_mut().zip(&parts) {
        let parsed: f64 = part.trim().parse().ok()?;
        if !parsed.is_finite() {
            return None;
        }
        *field = parsed;
    }
    let [hours, minutes, seconds] = fields;
    Some((hours * 3600.0 + minutes * 60.0 + seconds) * 1000.0)
}

/// Interpret a single `key=value` line.
///
/// ffmpeg writes microseconds under both `out_time_us` and the misnamed
/// `out_time_ms`, so both share the microsecond conversion.
pub fn parse_line(line: &str) -> Option<ProgressSample> {
    let line = line.trim();
    let (key, value) = line.split_once('=')?;
    let (key, value) = (key.trim(), value.trim());

    let elapsed_ms = match key {
        "out_time_us" | "out_time_ms" => value.parse::<f64>().ok().map(|us| us / 1000.0),
        "out_time" => parse_clock_to_ms(value),
        "progress" if value == "end" => return Some(ProgressSample::Completed),
        _ => None,
    }?;

    if elapsed_ms.is_finite() && elapsed_ms >= 0.0 {
        Some(ProgressSample::Elapsed { ms: elapsed_ms })
    } else {
        None
    }
}

/// Incremental line splitter plus monotonic percentage tracking
#[derive(Debug, Clone)]
pub struct ProgressParser {
    buffer: Vec<u8>,
    total_duration_ms: Option<f64>,
    latest_percent: f64,
}

impl ProgressParser {
    pub fn new(total_duration_ms: Option<f64>) -> Self {
        Self {
            buffer: Vec::new(),
            total_duration_ms: total_duration_ms.filter(|ms| ms.is_finite() && *ms > 0.0),
            latest_percent: 0.0,
        }
    }

    /// Highest running percentage reported so far
    pub fn latest_percent(&self) -> f64 {
        self.latest_percent
    }

    /// Append a chunk and interpret every complete line it finishes.
    /// The trailing partial line stays buffered for the next chunk.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<ProgressUpdate> {
        self.buffer.extend_from_slice(chunk);

        let mut updates = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            let text = String::from_utf8_lossy(&line);
            match parse_line(&text) {
                Some(ProgressSample::Elapsed { ms }) => {
                    if let Some(percent) = self.percent_for(ms) {
                        updates.push(ProgressUpdate::Running(percent));
                    }
                }
                Some(ProgressSample::Completed) => updates.push(ProgressUpdate::Completed),
                None => {}
            }
        }
        updates
    }

    fn percent_for(&mut self, elapsed_ms: f64) -> Option<f64> {
        let total = self.total_duration_ms?;
        let percent = clamp_percent(elapsed_ms / total * 100.0).min(RUNNING_PERCENT_CAP);
        self.latest_percent = self.latest_percent.max(percent);
        Some(self.latest_percent)
    }
}

/// Keeps the most recent characters of a stream, dropping the oldest.
///
/// Raw bytes are buffered and decoded only when read, so a multibyte
/// character split across two reads survives intact.
#[derive(Debug, Clone)]
pub struct StderrTail {
    bytes: Vec<u8>,
    max_chars: usize,
}

impl StderrTail {
    pub fn new(max_chars: usize) -> Self {
        Self {
            bytes: Vec::new(),
            max_chars,
        }
    }

    pub fn push(&mut self, chunk: &[u8]) {
        self.bytes.extend_from_slice(chunk);
        // Room for max_chars 4-byte characters plus a cut leading sequence.
        let max_bytes = self.max_chars.saturating_mul(4).saturating_add(3);
        let excess = self.bytes.len().saturating_sub(max_bytes);
        if excess > 0 {
            self.bytes.drain(..excess);
        }
    }

    /// The last `max_chars` characters captured
    pub fn text(&self) -> String {
        let decoded = String::from_utf8_lossy(&self.bytes);
        let excess = decoded.chars().count().saturating_sub(self.max_chars);
        match decoded.char_indices().nth(excess) {
            Some((cut, _)) => decoded[cut..].to_string(),
            None => String::new(),
        }
    }

    /// Trimmed diagnostic text, `None` when nothing useful was captured
    pub fn message(&self) -> Option<String> {
        let text = self.text();
        let trimmed = text.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
}
