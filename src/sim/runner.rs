//! Simulation runners.
//!
//! Lockstep runners evaluate both domains in one thread, one link tick at a
//! time. The threaded runner gives the link domain its own thread; the
//! cross-domain FIFOs are then the only state the two threads share, and a
//! tick channel keeps the system domain paced behind the link.

use crossbeam_channel::bounded;
use log::{debug, warn};

use crate::soc::System;

/// Ticks the system until nothing is in flight or `max_ticks` elapse.
///
/// # Returns
///
/// The number of link-domain ticks evaluated.
pub fn run_until_idle(system: &mut System, max_ticks: u64) -> u64 {
    let mut ticks = 0;
    while ticks < max_ticks && !system.is_idle() {
        system.tick();
        ticks += 1;
    }
    if !system.is_idle() {
        warn!("[Runner] not idle after {} ticks", ticks);
    }
    ticks
}

/// Feeds `words` to the host link as space frees up, then runs until idle.
///
/// # Returns
///
/// The number of link-domain ticks evaluated.
pub fn run_stream(system: &mut System, words: &[u32], max_ticks: u64) -> u64 {
    let mut offset = 0;
    let mut ticks = 0;
    while ticks < max_ticks {
        if offset < words.len() {
            offset += system.host_mut().write_words(&words[offset..]);
        } else if system.is_idle() {
            break;
        }
        system.tick();
        ticks += 1;
    }
    if offset < words.len() {
        warn!(
            "[Runner] {} of {} words never reached the link",
            words.len() - offset,
            words.len()
        );
    }
    debug!("[Runner] stream done after {} ticks", ticks);
    ticks
}

/// Link ticks the link thread may run ahead of the system thread.
const TICK_SLACK: usize = 64;

/// Runs both domains concurrently for `link_ticks` link-domain ticks.
///
/// The link domain runs on a scoped thread and hands the system domain one
/// token per link tick it completes. The calling thread evaluates
/// `system_ticks_per_link_tick` system ticks per token, so the system domain
/// never runs ahead of the link and its timeouts see the same word spacing
/// as in lockstep.
pub fn run_threaded(system: &mut System, link_ticks: u64) {
    let ratio = system.ratio();
    let link = &mut system.link;
    let soc = &mut system.soc;
    let (tokens, ticked) = bounded::<()>(TICK_SLACK);
    std::thread::scope(|s| {
        s.spawn(move || {
            for _ in 0..link_ticks {
                link.tick();
                if tokens.send(()).is_err() {
                    break;
                }
            }
        });
        for () in ticked.iter() {
            for _ in 0..ratio {
                soc.tick();
            }
        }
    });
    debug!(
        "[Runner] threaded run done: {} link ticks, {} system ticks",
        link_ticks,
        link_ticks.saturating_mul(u64::from(ratio))
    );
}
