//! Chrome Trace ("flame style") profiling of frame stages.
//!
//! Feature-gated with `--features profiling`; every call compiles to a no-op
//! otherwise.
//!
//! Usage:
//!   vectoroids::profiling::init("profile/trace.json");
//!   {
//!     let _g = vectoroids::profiling::span("frame::tick");
//!     // run a tick...
//!   }
//!   vectoroids::profiling::shutdown();
//!
//! The output loads in Perfetto or `chrome://tracing`. The frame loop is
//! single-threaded, so events carry a fixed pid/tid and no thread metadata.

#[cfg(feature = "profiling")]
mod enabled {
    use std::fs::File;
    use std::io::{BufWriter, Write};
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Mutex, OnceLock};
    use std::time::Instant;

    struct Event {
        name: &'static str,
        ts_us: u64,
        dur_us: u64,
    }

    struct State {
        start: Instant,
        out_path: PathBuf,
        is_on: AtomicBool,
        events: Mutex<Vec<Event>>,
    }

    static STATE: OnceLock<State> = OnceLock::new();

    /// Initialize the profiler and set the output path.
    pub fn init<P: AsRef<Path>>(path: P) {
        let _ = STATE.set(State {
            start: Instant::now(),
            out_path: path.as_ref().to_path_buf(),
            is_on: AtomicBool::new(true),
            events: Mutex::new(Vec::new()),
        });
    }

    /// Stop recording and write the Chrome Trace JSON.
    pub fn shutdown() {
        let Some(st) = STATE.get() else { return };
        st.is_on.store(false, Ordering::Release);
        if let Err(e) = write_trace(st) {
            eprintln!("profiling::shutdown failed to write trace: {e}");
        }
    }

    fn write_trace(st: &State) -> std::io::Result<()> {
        let events = std::mem::take(&mut *st.events.lock().unwrap());
        if let Some(parent) = st.out_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut w = BufWriter::new(File::create(&st.out_path)?);
        write!(w, "{{\"traceEvents\":[")?;
        for (i, ev) in events.iter().enumerate() {
            if i > 0 {
                write!(w, ",")?;
            }
            write!(
                w,
                "{{\"name\":\"{}\",\"cat\":\"frame\",\"ph\":\"X\",\"ts\":{},\"dur\":{},\"pid\":1,\"tid\":1}}",
                ev.name, ev.ts_us, ev.dur_us
            )?;
        }
        write!(w, "]}}")?;
        w.flush()
    }

    /// Start a span; the event is recorded when the guard drops.
    pub fn span(name: &'static str) -> SpanGuard {
        let active = STATE
            .get()
            .is_some_and(|st| st.is_on.load(Ordering::Acquire));
        let ts0 = if active {
            STATE.get().unwrap().start.elapsed().as_micros() as u64
        } else {
            0
        };
        SpanGuard { name, ts0, active }
    }

    /// RAII guard recording one complete event on drop.
    pub struct SpanGuard {
        name: &'static str,
        ts0: u64,
        active: bool,
    }

    impl Drop for SpanGuard {
        fn drop(&mut self) {
            if !self.active {
                return;
            }
            let Some(st) = STATE.get() else { return };
            let ts1 = st.start.elapsed().as_micros() as u64;
            st.events.lock().unwrap().push(Event {
                name: self.name,
                ts_us: self.ts0,
                dur_us: ts1.saturating_sub(self.ts0),
            });
        }
    }
}

#[cfg(not(feature = "profiling"))]
mod disabled {
    use std::path::Path;

    /// Initialize profiler (no-op when profiling is disabled).
    #[inline]
    pub fn init<P: AsRef<Path>>(_path: P) {}

    /// Shut down profiler (no-op).
    #[inline]
    pub fn shutdown() {}

    /// Start a span (no-op).
    #[inline]
    pub fn span(_name: &'static str) -> SpanGuard {
        SpanGuard
    }

    /// No-op span guard.
    pub struct SpanGuard;
}

#[cfg(feature = "profiling")]
pub use enabled::{init, shutdown, span, SpanGuard};

#[cfg(not(feature = "profiling"))]
pub use disabled::{init, shutdown, span, SpanGuard};
