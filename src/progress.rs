//! Progress bars and a log writer that prints above them.

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::{self, Write};
use std::sync::OnceLock;
use tracing_subscriber::fmt::MakeWriter;

static MULTI_PROGRESS: OnceLock<MultiProgress> = OnceLock::new();

fn multi_progress() -> &'static MultiProgress {
    MULTI_PROGRESS.get_or_init(|| {
        let mp = MultiProgress::new();
        mp.set_draw_target(ProgressDrawTarget::stderr_with_hz(10));
        mp
    })
}

/// Progress bar for embedding `len` chunks
pub fn embedding_progress(len: u64) -> ProgressBar {
    let pb = multi_progress().add(ProgressBar::new(len));
    if let Ok(style) =
        ProgressStyle::with_template("{spinner} Embedding [{bar:30}] {pos}/{len} chunks ({eta})")
    {
        pb.set_style(style.progress_chars("=> "));
    }
    pb
}

fn emit_line(line: &str) {
    let line = line.trim_end_matches('\r');
    let mp = multi_progress();
    // A hidden target (stderr is not a terminal) swallows println
    if mp.is_hidden() {
        eprintln!("{}", line);
    } else {
        let _ = mp.println(line);
    }
}

/// `MakeWriter` for tracing-subscriber that routes log lines through the
/// shared `MultiProgress` so active bars stay pinned at the bottom.
#[derive(Default, Clone)]
pub struct LogWriterFactory;

#[derive(Default)]
pub struct LogWriter {
    pending: String,
}

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.push_str(&String::from_utf8_lossy(buf));
        while let Some(idx) = self.pending.find('\n') {
            let line: String = self.pending.drain(..=idx).collect();
            emit_line(line.trim_end_matches('\n'));
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if !self.pending.is_empty() {
            let line = std::mem::take(&mut self.pending);
            emit_line(&line);
        }
        Ok(())
    }
}

impl Drop for LogWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

impl<'a> MakeWriter<'a> for LogWriterFactory {
    type Writer = LogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LogWriter::default()
    }
}
