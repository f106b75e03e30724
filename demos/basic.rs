//! Basic example demonstrating owning handles and opaque wrappers.
//!
//! Run with: cargo run --example basic

use unique::{DropFailure, Error, OwningHandle, ReleaseFn, Widget, WidgetOptions};

fn main() -> unique::Result<()> {
    println!("--- Boxed value ---");
    let mut counter = OwningHandle::new(0_u64);
    for _ in 0..3 {
        *counter += 1;
    }
    println!("counter: {}", *counter);

    let moved = counter.take();
    println!("after take: source empty={}, target owning={}", counter.is_empty(), moved.is_owning());

    println!("\n--- Array ---");
    let squares = OwningHandle::new_array(6, |i| i * i);
    println!("squares ({}): {:?}", squares.len(), &*squares);

    println!("\n--- Custom release ---");
    let session: OwningHandle<u32, _> = OwningHandle::with_policy(
        17,
        ReleaseFn::infallible(|id: u32| println!("closing session {}", id)),
    );
    println!("session: {:?}", session.get());
    drop(session);

    let busy: OwningHandle<u32, _> = OwningHandle::with_policy(
        18,
        ReleaseFn::new(|id: u32| Err(Error::Release(format!("session {} busy", id)))),
    )
    .on_drop_failure(DropFailure::Ignore);
    match busy.close() {
        Ok(()) => println!("closed"),
        Err(e) => println!("close failed: {}", e),
    }

    println!("\n--- Opaque wrapper ---");
    let mut widget = Widget::with_options(
        WidgetOptions::named("gauge").on_teardown(|name| println!("teardown: {}", name)),
    )?;
    widget.set_name("dial");
    let copy = widget.clone();
    widget.set_name("knob");
    println!("original: {}", widget.describe());
    println!("copy: {}", copy.describe());

    #[cfg(unix)]
    {
        println!("\n--- Journal ---");
        let path = std::env::temp_dir().join("unique_demo_journal.log");
        let mut journal = unique::Journal::open(&path)?;
        journal.append("demo started")?;
        journal.append("demo finished")?;
        println!("wrote {} entries to {}", journal.entries(), journal.path().display());
        // Explicit close surfaces close(2) errors
        journal.close()?;
    }

    // Everything still owned is released on drop
    println!("\n--- Done ---");
    Ok(())
}
