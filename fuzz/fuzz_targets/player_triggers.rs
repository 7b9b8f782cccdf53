#![no_main]

use libfuzzer_sys::fuzz_target;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use thasinn::audio::NullAudioEngine;
use thasinn::catalog::Catalog;
use thasinn::config::MemoryPreferences;
use thasinn::player::{Player, Trigger};
use thasinn::progress::BarBounds;
use thasinn::view::View;

fuzz_target!(|data: &[u8]| {
    let seed = data.iter().fold(0u64, |acc, byte| acc.rotate_left(5) ^ u64::from(*byte));
    let mut player = Player::with_rng(
        Catalog::builtin(),
        Box::new(NullAudioEngine::new()),
        Box::new(MemoryPreferences::default()),
        SmallRng::seed_from_u64(seed),
    );
    let mut view = View::new(&player);

    for byte in data {
        let arg = usize::from(byte >> 4);
        let trigger = match byte % 12 {
            0 => Trigger::TogglePlayback,
            1 => Trigger::Previous,
            2 => Trigger::Next,
            3 => Trigger::ToggleShuffle,
            4 => Trigger::ToggleLoop,
            5 => Trigger::SetVolume(f32::from(byte >> 4) / 10.0),
            6 => Trigger::ToggleMute,
            7 => Trigger::Scrub {
                pointer_x: f64::from(*byte),
                bar: BarBounds {
                    left: 0.0,
                    width: 100.0,
                },
            },
            8 => Trigger::PlayAlbum(arg),
            9 => Trigger::PlayRow(arg),
            10 => Trigger::PlayTopSong(arg),
            _ => Trigger::TrackEnded,
        };
        player.dispatch(trigger);
        view.sync(&player);

        assert!(player.state().current_index < player.active_len());
        assert!((0.0..=1.0).contains(&player.state().volume));
        assert_eq!(view.table.active(), player.active_row());
        assert_eq!(view.now_playing.title, player.current_song().title);
    }
});
