use std::collections::HashSet;

use musify::Library;
use proptest::prelude::*;
use tempfile::TempDir;

fn song_name() -> impl Strategy<Value = String> {
    "[A-Za-z0-9][A-Za-z0-9 ]{0,11}"
}

proptest! {
    #[test]
    fn search_matches_every_added_name(names in prop::collection::vec(song_name(), 0..40)) {
        let mut library = Library::new();
        for name in &names {
            library.add(name).unwrap();
        }

        let distinct: HashSet<&String> = names.iter().collect();
        prop_assert_eq!(library.len(), distinct.len());
        for name in &names {
            prop_assert!(library.search(name));
        }
        let never_added = "\u{1F3B5} never added";
        prop_assert!(!library.search(never_added));
    }

    #[test]
    fn re_adding_never_resets_counts(name in song_name(), plays in 1u64..20) {
        let mut library = Library::new();
        library.add(&name).unwrap();
        for _ in 0..plays {
            library.play(&name);
        }
        prop_assert!(!library.add(&name).unwrap());
        prop_assert_eq!(library.play_count(&name), Some(plays));
    }

    #[test]
    fn most_played_is_first_maximum(plays in prop::collection::vec(0u8..5, 1..20)) {
        let mut library = Library::new();
        for (idx, count) in plays.iter().enumerate() {
            let name = format!("song {idx}");
            library.add(&name).unwrap();
            for _ in 0..*count {
                library.play(&name);
            }
        }

        let max = *plays.iter().max().unwrap();
        let first = plays.iter().position(|&c| c == max).unwrap();
        prop_assert_eq!(library.most_played(), Some(format!("song {first}")));
    }

    #[test]
    fn save_load_round_trips(names in prop::collection::vec(song_name(), 0..20), plays in prop::collection::vec(0usize..20, 0..30)) {
        let mut library = Library::new();
        for name in &names {
            library.add(name).unwrap();
        }
        if !names.is_empty() {
            for pick in plays {
                library.play(&names[pick % names.len()]);
            }
        }

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("library.txt");
        library.save(&path).unwrap();

        let mut restored = Library::new();
        restored.load(&path).unwrap();
        prop_assert_eq!(restored.entries(), library.entries());
    }
}
