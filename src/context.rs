use std::path::Path;

use tokio::sync::mpsc::UnboundedReceiver;

use crate::config::InnerSettings;
use crate::error::{ScriptError, ScriptResult};
use crate::metrics;
use crate::replay::{FrameGate, FrameSnapshot, HotkeyAction, Hotkeys, ReplayScheduler, ReplayState};
use crate::script::{ButtonSet, ScriptContainer};
use crate::transfer::{ReceivedScript, ScriptDirectory};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /* Gate is closed, the game must not simulate this tick. */
    Paused,
    /* Nothing replaying, the game runs on real input. */
    Idle,
    Replayed(u32),
    /* Script ran out on this tick. Real input is back. */
    Finished,
    /* Replay broke off on a bad command. Real input is back. */
    Aborted,
}

/* Everything the host tick loop owns. Scripts are only ever loaded, replayed and unloaded from
 * here, so a script arriving over the network can never swap the buffer under a running replay.
 */
pub struct TasContext {
    scheduler: ReplayScheduler,
    gate: FrameGate,
    hotkeys: Hotkeys,
    directory: ScriptDirectory,
    received: UnboundedReceiver<ReceivedScript>,
    latest_received: Option<ReceivedScript>,
    autoload: bool,
    autoplay: bool,
}

impl TasContext {
    pub fn new(config: &InnerSettings, received: UnboundedReceiver<ReceivedScript>) -> Self {
        Self {
            scheduler: ReplayScheduler::new(),
            gate: FrameGate::new(),
            hotkeys: Hotkeys::new(&config.hotkeys),
            directory: ScriptDirectory::new(&config.storage.script_directory),
            received,
            latest_received: None,
            autoload: config.host.autoload_received,
            autoplay: config.host.autoplay,
        }
    }

    pub fn state(&self) -> ReplayState {
        self.scheduler.state()
    }

    pub fn scheduler(&self) -> &ReplayScheduler {
        &self.scheduler
    }

    pub fn gate(&self) -> &FrameGate {
        &self.gate
    }

    pub fn gate_mut(&mut self) -> &mut FrameGate {
        &mut self.gate
    }

    pub fn latest_received(&self) -> Option<&ReceivedScript> {
        self.latest_received.as_ref()
    }

    /* Loads a script from the script directory by name. A bad name is refused before anything is
     * read or counted, and leaves the current script alone. */
    pub fn load_script(&mut self, name: &str) -> ScriptResult<()> {
        let path = self
            .directory
            .script_path(name)
            .map_err(|e| ScriptError::InvalidName(e.to_string()))?;
        self.load_path(&path)
    }

    /* A failed load leaves nothing loaded, even if something was before. */
    pub fn load_path(&mut self, path: &Path) -> ScriptResult<()> {
        let res = ScriptContainer::from_file(path);
        metrics::inc_script_loads(&res);
        match res {
            Ok(script) => {
                log::info!("Loaded {}: {}", path.display(), script.header());
                self.scheduler.load(script);
                Ok(())
            }
            Err(e) => {
                log::warn!("Could not load {}: {}", path.display(), e);
                self.scheduler.stop_replay();
                Err(e)
            }
        }
    }

    pub fn load_latest(&mut self) -> ScriptResult<()> {
        let path = match &self.latest_received {
            Some(r) => r.path.clone(),
            None => return Err(ScriptError::NotLoaded),
        };
        self.load_path(&path)
    }

    pub fn start_replay(&mut self) -> ScriptResult<()> {
        self.gate.play();
        self.scheduler.start_replay()
    }

    pub fn stop_replay(&mut self) {
        self.scheduler.stop_replay();
    }

    /* Replays the loaded script from its first frame again. */
    pub fn restart_replay(&mut self) -> ScriptResult<()> {
        self.scheduler.rewind();
        self.start_replay()
    }

    pub fn handle_pad(&mut self, held: ButtonSet) -> Option<HotkeyAction> {
        let action = self.hotkeys.apply(held, &mut self.gate);
        if let Some(a) = action {
            log::debug!("Hotkey {:?}, gate paused: {}", a, self.gate.is_paused());
        }
        action
    }

    /* Takes in whatever the receiver finished since the last tick. */
    pub fn poll_received(&mut self) {
        while let Ok(script) = self.received.try_recv() {
            log::info!("Script '{}' is ready ({} bytes)", script.name, script.size);
            let path = script.path.clone();
            self.latest_received = Some(script);
            if !self.autoload {
                continue;
            }
            if self.load_path(&path).is_ok() && self.autoplay {
                if let Err(e) = self.start_replay() {
                    log::warn!("Could not start replay of {}: {}", path.display(), e);
                }
            }
        }
    }

    /* One host frame. `held` is the real controller's button state, `simulate` runs the game's
     * frame with the replayed input, or with real input when given `None`. It is not called at
     * all while the gate is closed. */
    pub fn tick<F>(&mut self, held: ButtonSet, simulate: F) -> TickOutcome
    where
        F: FnOnce(Option<&FrameSnapshot>),
    {
        self.poll_received();
        self.handle_pad(held);

        if !self.gate.admits() {
            return TickOutcome::Paused;
        }
        let outcome = if self.scheduler.is_replaying() {
            match self.scheduler.get_next_frame() {
                Ok(snapshot) => {
                    let frame = snapshot.frame;
                    simulate(Some(snapshot));
                    TickOutcome::Replayed(frame)
                }
                Err(e) => {
                    simulate(None);
                    if e.is_end_of_script() {
                        TickOutcome::Finished
                    } else {
                        TickOutcome::Aborted
                    }
                }
            }
        } else {
            simulate(None);
            TickOutcome::Idle
        };
        self.gate.finish_tick();
        outcome
    }
}

#[cfg(test)]
mod test {
    use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};

    use super::*;
    use crate::config::test::default_config;
    use crate::script::test::ScriptBuilder;
    use crate::script::Button;

    struct Fixture {
        ctx: TasContext,
        tx: UnboundedSender<ReceivedScript>,
        dir: tempfile::TempDir,
    }

    fn fixture(autoload: bool, autoplay: bool) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let mut config = default_config();
        config.storage.script_directory = dir.path().to_str().unwrap().into();
        config.host.autoload_received = autoload;
        config.host.autoplay = autoplay;
        let (tx, rx) = unbounded_channel();
        Fixture {
            ctx: TasContext::new(&config, rx),
            tx,
            dir,
        }
    }

    impl Fixture {
        fn deliver(&self, name: &str, data: &[u8]) {
            let path = self.dir.path().join(name);
            std::fs::write(&path, data).unwrap();
            self.tx
                .send(ReceivedScript {
                    name: name.into(),
                    path,
                    size: data.len() as u32,
                })
                .unwrap();
        }

        fn tick(&mut self) -> (TickOutcome, Option<FrameSnapshot>) {
            self.tick_with(ButtonSet::NONE)
        }

        fn tick_with(&mut self, held: ButtonSet) -> (TickOutcome, Option<FrameSnapshot>) {
            let mut seen = None;
            let outcome = self.ctx.tick(held, |s| seen = s.copied());
            (outcome, seen)
        }
    }

    /* Every frame holds a distinct button so scripts can be told apart by their input. */
    fn marked_script(button: Button, frames: u32) -> Vec<u8> {
        let mut b = ScriptBuilder::new(1);
        for f in 0..frames {
            b = b.frame(f).controller(0, button.bit(), (f as i32, 0), (0, 0));
        }
        b.build()
    }

    #[test]
    fn test_idle_ticks_use_real_input() {
        let mut f = fixture(true, true);
        let mut called = false;
        assert_eq!(f.ctx.tick(ButtonSet::NONE, |s| called = s.is_none()), TickOutcome::Idle);
        assert!(called);
    }

    #[test]
    fn test_autoload_and_autoplay() {
        let mut f = fixture(true, true);
        f.deliver("a.stas", &marked_script(Button::A, 3));

        for expected in 0..3 {
            let (outcome, snap) = f.tick();
            assert_eq!(outcome, TickOutcome::Replayed(expected));
            let snap = snap.unwrap();
            assert!(snap.players[0].current().buttons.is_pressed(Button::A));
            assert_eq!(snap.players[0].current().left_stick.x, expected as i32);
        }
        assert_eq!(f.tick(), (TickOutcome::Finished, None));
        assert_eq!(f.tick(), (TickOutcome::Idle, None));
        assert_eq!(f.ctx.state(), ReplayState::Idle);
    }

    #[test]
    fn test_autoload_without_autoplay() {
        let mut f = fixture(true, false);
        f.deliver("a.stas", &marked_script(Button::A, 2));
        assert_eq!(f.tick().0, TickOutcome::Idle);
        assert_eq!(f.ctx.state(), ReplayState::Loaded);
        f.ctx.start_replay().unwrap();
        assert_eq!(f.tick().0, TickOutcome::Replayed(0));
    }

    #[test]
    fn test_received_scripts_wait_for_manual_load() {
        let mut f = fixture(false, false);
        f.deliver("a.stas", &marked_script(Button::A, 2));
        f.tick();
        assert_eq!(f.ctx.state(), ReplayState::Idle);
        assert_eq!(f.ctx.latest_received().unwrap().name, "a.stas");
        f.ctx.load_latest().unwrap();
        assert_eq!(f.ctx.state(), ReplayState::Loaded);
        f.ctx.load_script("a.stas").unwrap();
        assert_eq!(f.ctx.state(), ReplayState::Loaded);
    }

    #[test]
    fn test_reload_during_replay_does_not_mix_scripts() {
        let mut f = fixture(true, true);
        f.deliver("a.stas", &marked_script(Button::A, 10));
        for _ in 0..4 {
            f.tick();
        }
        f.deliver("b.stas", &marked_script(Button::B, 10));

        let (outcome, snap) = f.tick();
        assert_eq!(outcome, TickOutcome::Replayed(0));
        let buttons = snap.unwrap().players[0].current().buttons;
        assert!(buttons.is_pressed(Button::B));
        assert!(!buttons.is_pressed(Button::A));

        for expected in 1..10 {
            let (outcome, snap) = f.tick();
            assert_eq!(outcome, TickOutcome::Replayed(expected));
            assert!(!snap.unwrap().players[0].current().buttons.is_pressed(Button::A));
        }
    }

    #[test]
    fn test_bad_script_unloads_previous_one() {
        let mut f = fixture(true, true);
        f.deliver("a.stas", &marked_script(Button::A, 10));
        f.tick();
        f.deliver("broken.stas", b"STAX and then some");
        let (outcome, snap) = f.tick();
        assert_eq!(outcome, TickOutcome::Idle);
        assert!(snap.is_none());
        assert_eq!(f.ctx.state(), ReplayState::Idle);
        assert!(f.ctx.scheduler().current_snapshot().is_neutral());
    }

    #[test]
    fn test_load_by_bad_name() {
        let mut f = fixture(false, false);
        assert!(matches!(f.ctx.load_script("../a.stas"), Err(ScriptError::InvalidName(..))));
        assert!(matches!(f.ctx.load_script("/etc/passwd"), Err(ScriptError::InvalidName(..))));

        std::fs::write(f.dir.path().join("good.stas"), marked_script(Button::A, 3)).unwrap();
        f.ctx.load_script("good.stas").unwrap();
        assert!(matches!(f.ctx.load_script("../good.stas"), Err(ScriptError::InvalidName(..))));
        assert_eq!(f.ctx.state(), ReplayState::Loaded);

        assert!(matches!(f.ctx.load_script("missing.stas"), Err(ScriptError::IO { .. })));
        assert!(matches!(f.ctx.load_latest(), Err(ScriptError::NotLoaded)));
    }

    #[test]
    fn test_pause_and_single_step_hold_script_and_game_together() {
        let mut f = fixture(true, true);
        f.deliver("a.stas", &marked_script(Button::A, 10));
        assert_eq!(f.tick().0, TickOutcome::Replayed(0));

        let pause = ButtonSet::of(&[Button::ZL, Button::ZR, Button::DDown]);
        let step = ButtonSet::of(&[Button::ZL, Button::ZR, Button::DRight]);

        let mut called = false;
        assert_eq!(f.ctx.tick(pause, |_| called = true), TickOutcome::Paused);
        assert!(!called);
        assert_eq!(f.tick().0, TickOutcome::Paused);
        assert_eq!(f.tick().0, TickOutcome::Paused);

        assert_eq!(f.tick_with(step).0, TickOutcome::Replayed(1));
        assert_eq!(f.tick_with(step).0, TickOutcome::Paused);
        assert_eq!(f.tick().0, TickOutcome::Paused);
        assert_eq!(f.tick_with(step).0, TickOutcome::Replayed(2));

        f.tick_with(ButtonSet::NONE);
        assert_eq!(f.tick_with(pause).0, TickOutcome::Replayed(3));
        assert_eq!(f.tick().0, TickOutcome::Replayed(4));
    }

    #[test]
    fn test_restart_replay() {
        let mut f = fixture(true, true);
        f.deliver("a.stas", &marked_script(Button::A, 5));
        f.tick();
        f.tick();
        f.ctx.restart_replay().unwrap();
        assert_eq!(f.tick().0, TickOutcome::Replayed(0));
        f.ctx.stop_replay();
        assert_eq!(f.tick().0, TickOutcome::Idle);
        assert!(matches!(f.ctx.restart_replay(), Err(ScriptError::NotLoaded)));
    }
}
