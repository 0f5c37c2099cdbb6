//! Property and fuzz-style tests for the core filters and parsers.

use proptest::prelude::*;
use stomplight::drivers::debounce::Debouncer;
use stomplight::drivers::edge::EdgeTracker;
use stomplight::drivers::input_line::parse_level_reply;
use stomplight::layout::wrap_degrees;
use stomplight::rng::Rng;

// ── Debouncer ────────────────────────────────────────────────

proptest! {
    /// After an arbitrary noise prefix, a raw level held for the full
    /// window flips the stable output exactly once and never before the
    /// window elapses.
    #[test]
    fn held_signal_flips_stable_exactly_once(
        window in 1u64..200,
        noise in proptest::collection::vec(any::<bool>(), 0..50),
    ) {
        let mut d = Debouncer::new(window);
        let mut now = 0u64;
        d.update(false, now);
        for raw in noise {
            now += 5;
            d.update(raw, now);
        }
        // Settle low first so the rise below is a real transition.
        for _ in 0..=(window / 5 + 1) {
            now += 5;
            d.update(false, now);
        }
        prop_assert!(!d.stable());

        let rise_at = now + 5;
        let mut flips = 0;
        let mut prev = d.stable();
        for _ in 0..(window / 5 + 20) {
            now += 5;
            let s = d.update(true, now);
            if s != prev {
                flips += 1;
                prop_assert!(
                    now.saturating_sub(rise_at) >= window,
                    "stable flipped {} ms after the rise, window is {}",
                    now - rise_at,
                    window
                );
            }
            prev = s;
        }
        prop_assert_eq!(flips, 1);
    }

    /// Pulses strictly shorter than the window never reach the stable
    /// output.
    #[test]
    fn short_pulses_are_invisible(
        window in 10u64..200,
        pulses in proptest::collection::vec(1u64..9, 1..20),
    ) {
        let mut d = Debouncer::new(window);
        let mut now = 0u64;
        d.update(false, now);
        for pulse in pulses {
            // Pulse lasts `pulse` ms, under a tenth of the window's floor.
            now += 20;
            d.update(true, now);
            now += pulse;
            d.update(false, now);
            prop_assert!(!d.stable());
        }
    }
}

// ── EdgeTracker ──────────────────────────────────────────────

proptest! {
    /// `just_activated` is true iff the previous stable was false and the
    /// current is true, and each edge is exactly one call wide.
    #[test]
    fn edges_match_adjacent_pairs(signal in proptest::collection::vec(any::<bool>(), 1..100)) {
        let mut tracker = EdgeTracker::new();
        let mut previous: Option<bool> = None;
        for current in signal {
            let edges = tracker.update(current);
            match previous {
                None => {
                    prop_assert!(!edges.just_activated && !edges.just_deactivated);
                }
                Some(prev) => {
                    prop_assert_eq!(edges.just_activated, !prev && current);
                    prop_assert_eq!(edges.just_deactivated, prev && !current);
                }
            }
            previous = Some(current);
        }
    }
}

// ── Query reply parser ───────────────────────────────────────

proptest! {
    /// The parse ladder never panics on arbitrary input.
    #[test]
    fn parser_total_over_arbitrary_input(reply in "\\PC*") {
        let _ = parse_level_reply(&reply);
    }

    /// Bare digits and the `=active`/`=inactive` vocabularies always
    /// parse, quoted or not.
    #[test]
    fn known_vocabularies_always_parse(pin in 0u8..=27) {
        prop_assert_eq!(parse_level_reply("1"), Some(true));
        prop_assert_eq!(parse_level_reply("0"), Some(false));
        prop_assert_eq!(parse_level_reply(&format!("{pin}=active")), Some(true));
        prop_assert_eq!(parse_level_reply(&format!("{pin}=inactive")), Some(false));
        prop_assert_eq!(parse_level_reply(&format!("\"{pin}\"=active")), Some(true));
        prop_assert_eq!(parse_level_reply(&format!("gpio {pin}: 1")), Some(true));
        prop_assert_eq!(parse_level_reply(&format!("gpio {pin}: 0")), Some(false));
    }
}

// ── Supporting pieces ────────────────────────────────────────

proptest! {
    #[test]
    fn rng_range_stays_in_bounds(seed in any::<u64>(), low in 0u64..1000, span in 1u64..1000) {
        let mut rng = Rng::seeded(seed);
        for _ in 0..100 {
            let v = rng.gen_range(low, low + span);
            prop_assert!(v >= low && v < low + span);
        }
    }

    #[test]
    fn wrapped_degrees_always_normalized(deg in -10_000f32..10_000f32) {
        let w = wrap_degrees(deg);
        prop_assert!((0.0..360.0).contains(&w), "{deg} wrapped to {w}");
    }
}
