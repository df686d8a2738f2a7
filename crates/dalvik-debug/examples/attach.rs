//! Attach to a forwarded JDWP endpoint, break on a method, dump the paused frame.
//!
//! Forward the target first: `adb forward tcp:8700 jdwp:<pid>`.

use dalvik_debug::{BreakpointSpec, DebugError, Debugger};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), DebugError> {
    let dbg = Debugger::start("127.0.0.1", 8700).await?;
    dbg.print_summary();

    let bp = dbg.create_breakpoint(BreakpointSpec {
        class_signature: "Lsh/kau/playground/quotes/QuotesRepo;".into(),
        method_name: "loadQuotes".into(),
        method_signature: "()Ljava/util/List;".into(),
        ..BreakpointSpec::default()
    })?;

    let hits = dbg.clone();
    bp.set_callback(move |event, _composite, bp| {
        let hits = hits.clone();
        async move {
            if let Some(thread) = event.thread() {
                if let Ok(info) = hits.thread(thread).await {
                    for frame in info.frames().iter() {
                        println!("{frame}");
                    }
                }
            }
            bp.poke();
        }
    });
    bp.arm().await?;
    dbg.resume_vm().await?;

    // parked until the callback has seen the hit
    bp.wait().await;
    dbg.resume_vm().await?;
    Ok(())
}
