//! Demo runtime: one task that owns every stateful component
//!
//! Commands arrive over an mpsc channel. Between commands the task sleeps
//! until the earliest pending timer of any component, then advances all of
//! them by the wall time that passed and broadcasts the resulting events.

mod keys;

use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::events::DemoEvent;
use crate::hero::{HeroIntro, Scene, Typewriter, TypewriterConfig, HEADLINE_PHRASES};
use crate::pipeline::{
    Modality, PipelineController, PipelineSnapshot, ResultRecord, ResultsReveal, Task,
};
use crate::sequencer::{ProcessingAnimator, ProgressEffect, SceneSequencer, SequencerEffect};

pub use keys::{InputListener, NavKey};

/// Requests handled by the runtime task
#[derive(Debug)]
pub enum Command {
    /// Upload detection produced a modality
    SetModality(Modality),
    /// Select or clear the prediction task
    SetTask(Option<Task>),
    /// Start the processing animation
    StartProcessing,
    /// Mount the hero walkthrough (replaces any mounted one)
    MountHero,
    /// Tear down the hero walkthrough
    UnmountHero,
    /// Navigation input for the hero walkthrough
    Key(NavKey),
    /// Play the single-screen intro from the top
    PlayIntro,
    /// Start cycling the headline typewriter
    StartHeadline,
    /// Current pipeline state
    Snapshot(oneshot::Sender<PipelineSnapshot>),
    /// Result record, once results are visible
    Results(oneshot::Sender<Option<ResultRecord>>),
    /// Stop the runtime even if other senders are still alive
    Shutdown,
}

/// Owns the pipeline controller and every animator
pub struct DemoApp {
    config: Config,
    pipeline: PipelineController,
    hero: Option<SceneSequencer<Scene>>,
    intro: HeroIntro,
    headline: Option<Typewriter>,
    processing: Option<ProcessingAnimator>,
    reveal: Option<ResultsReveal>,
    event_tx: broadcast::Sender<DemoEvent>,
}

impl DemoApp {
    pub fn new(config: Config, event_tx: broadcast::Sender<DemoEvent>) -> Self {
        Self {
            config,
            pipeline: PipelineController::new(event_tx.clone()),
            hero: None,
            intro: HeroIntro::new(),
            headline: None,
            processing: None,
            reveal: None,
            event_tx,
        }
    }

    #[cfg(test)]
    pub fn pipeline(&self) -> &PipelineController {
        &self.pipeline
    }

    #[cfg(test)]
    pub fn hero(&self) -> Option<&SceneSequencer<Scene>> {
        self.hero.as_ref()
    }

    /// Run until `Command::Shutdown` or until the command channel closes
    pub async fn run(mut self, mut command_rx: mpsc::Receiver<Command>) {
        info!("demo runtime started");
        let mut last = Instant::now();

        loop {
            let wait = self.time_until_next();
            let sleep = async move {
                match wait {
                    Some(d) => tokio::time::sleep(d).await,
                    None => std::future::pending::<()>().await,
                }
            };

            tokio::select! {
                command = command_rx.recv() => {
                    self.catch_up(&mut last);
                    match command {
                        Some(Command::Shutdown) | None => break,
                        Some(command) => self.handle(command),
                    }
                }
                _ = sleep => {
                    self.catch_up(&mut last);
                }
            }
        }

        self.shutdown();
        info!("demo runtime stopped");
    }

    fn catch_up(&mut self, last: &mut Instant) {
        let now = Instant::now();
        self.advance(now.saturating_duration_since(*last));
        *last = now;
    }

    /// Apply one command
    pub fn handle(&mut self, command: Command) {
        match command {
            Command::SetModality(modality) => {
                self.stop_processing();
                self.pipeline.set_modality(modality);
            }
            Command::SetTask(task) => {
                self.stop_processing();
                self.pipeline.set_task(task);
            }
            Command::StartProcessing => {
                if let Some(run) = self.pipeline.start_processing() {
                    self.reveal = None;
                    self.processing = Some(ProcessingAnimator::start(
                        run,
                        self.config.progress_plan(),
                        self.config.progress_tick,
                    ));
                }
            }
            Command::MountHero => self.mount_hero(),
            Command::UnmountHero => {
                if let Some(hero) = self.hero.take() {
                    hero.teardown();
                    info!("hero unmounted");
                }
            }
            Command::Key(key) => self.handle_key(key),
            Command::PlayIntro => self.intro.restart(),
            Command::StartHeadline => self.start_headline(),
            Command::Snapshot(reply) => {
                let _ = reply.send(self.pipeline.state().snapshot());
            }
            Command::Results(reply) => {
                let _ = reply.send(self.pipeline.state().results());
            }
            Command::Shutdown => self.shutdown(),
        }
    }

    fn mount_hero(&mut self) {
        if let Some(old) = self.hero.take() {
            old.teardown();
        }
        match SceneSequencer::new(Scene::ALL.to_vec(), self.config.sequencer()) {
            Ok(mut hero) => {
                let effects = hero.start();
                self.hero = Some(hero);
                self.emit_scene_effects(effects);
            }
            Err(e) => error!(?e, "failed to mount hero"),
        }
    }

    fn start_headline(&mut self) {
        match Typewriter::new(HEADLINE_PHRASES, TypewriterConfig::default()) {
            Ok(mut headline) => {
                headline.start();
                self.headline = Some(headline);
            }
            Err(e) => error!(?e, "failed to start headline"),
        }
    }

    fn handle_key(&mut self, key: NavKey) {
        if key == NavKey::Restart && self.hero.is_none() {
            info!("remounting hero");
            self.mount_hero();
            return;
        }
        let Some(hero) = self.hero.as_mut() else {
            debug!(?key, "no hero mounted, ignoring key");
            return;
        };

        if key.is_navigation() && hero.is_auto_playing() {
            info!(?key, "manual navigation, auto-play stopped");
        }

        let effects = match key {
            NavKey::Right | NavKey::Space => hero.next(),
            NavKey::Left => hero.prev(),
            NavKey::Scene(n) => hero.go_to(n.min(isize::MAX as usize) as isize),
            NavKey::ToggleAutoPlay => {
                hero.toggle_auto_play();
                info!(state = %hero.state(), "auto-play toggled");
                Vec::new()
            }
            NavKey::Restart => hero.reset(),
        };
        self.emit_scene_effects(effects);
    }

    /// Discard a running processing animation and any results count-up
    fn stop_processing(&mut self) {
        if let Some(mut animator) = self.processing.take() {
            animator.cancel();
            info!(run = %animator.run(), "processing animation discarded");
        }
        if let Some(mut reveal) = self.reveal.take() {
            reveal.cancel();
        }
    }

    /// Advance every component by `by`
    pub fn advance(&mut self, by: Duration) {
        if let Some(hero) = self.hero.as_mut() {
            let effects = hero.advance(by);
            self.emit_scene_effects(effects);
        }

        for cue in self.intro.advance(by) {
            self.emit(DemoEvent::HeroCue { cue });
        }

        let texts = match self.headline.as_mut() {
            Some(headline) => headline.advance(by),
            None => Vec::new(),
        };
        for text in texts {
            self.emit(DemoEvent::HeadlineChanged { text });
        }

        // A count-up started by a completion below begins at zero
        self.advance_reveal(by);
        self.advance_processing(by);
    }

    fn advance_processing(&mut self, by: Duration) {
        let Some(animator) = self.processing.as_mut() else {
            return;
        };
        let run = animator.run();

        let mut events = Vec::new();
        let mut completion = None;
        for effect in animator.advance(by) {
            match effect {
                ProgressEffect::Tick(snapshot) => events.push(DemoEvent::ProcessingProgress {
                    run,
                    elapsed_ms: snapshot.elapsed.as_millis() as u64,
                    active_step: snapshot.active_step,
                    percents: snapshot.percents,
                }),
                ProgressEffect::Complete(c) => completion = Some(c),
            }
        }
        for event in events {
            self.emit(event);
        }

        if let Some(c) = completion {
            self.processing = None;
            if !self.pipeline.complete_processing(c) {
                warn!(%run, "processing finished but the run was no longer active");
                return;
            }
            if let Some(record) = self.pipeline.state().results() {
                self.reveal = Some(ResultsReveal::start(
                    record,
                    self.config.progress_tick,
                    self.config.count_up,
                ));
            }
        }
    }

    fn advance_reveal(&mut self, by: Duration) {
        let Some(reveal) = self.reveal.as_mut() else {
            return;
        };

        let frames = reveal.advance(by);
        let ready = reveal.is_finished().then(|| reveal.record().task);
        for frame in frames {
            self.emit(DemoEvent::ResultsCountUp {
                score: frame.score,
                metrics: frame.metrics,
            });
        }
        if let Some(task) = ready {
            self.reveal = None;
            info!(%task, "results ready");
            self.emit(DemoEvent::ResultsReady { task });
        }
    }

    /// Time until the earliest pending timer of any component
    pub fn time_until_next(&self) -> Option<Duration> {
        [
            self.hero.as_ref().and_then(|h| h.time_until_next()),
            self.intro.time_until_next(),
            self.headline.as_ref().and_then(|h| h.time_until_next()),
            self.processing.as_ref().and_then(|p| p.time_until_next()),
            self.reveal.as_ref().and_then(|r| r.time_until_next()),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    fn shutdown(&mut self) {
        self.stop_processing();
        if let Some(hero) = self.hero.take() {
            hero.teardown();
        }
        self.intro.stop();
        if let Some(headline) = self.headline.as_mut() {
            headline.stop();
        }
    }

    fn emit_scene_effects(&self, effects: Vec<SequencerEffect<Scene>>) {
        for effect in effects {
            let event = match effect {
                SequencerEffect::Apply { index, step } => {
                    DemoEvent::SceneApplied { index, scene: step }
                }
                SequencerEffect::Complete => DemoEvent::SceneSequenceComplete,
                SequencerEffect::Handoff => DemoEvent::SceneHandoff,
            };
            self.emit(event);
        }
    }

    fn emit(&self, event: DemoEvent) {
        debug!(%event, "emitting event");
        let _ = self.event_tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use std::io::{BufReader, Read};
    use std::sync::mpsc as std_mpsc;

    use super::*;
    use crate::pipeline::{Model, Stage};
    use crate::sequencer::SequencerState;

    const DELAY: Duration = Duration::from_millis(6000);

    fn create_app() -> (DemoApp, broadcast::Receiver<DemoEvent>) {
        let (tx, rx) = broadcast::channel(1024);
        (DemoApp::new(Config::default(), tx), rx)
    }

    fn drain(rx: &mut broadcast::Receiver<DemoEvent>) -> Vec<DemoEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn test_upload_to_results_scenario() {
        let (mut app, _rx) = create_app();

        app.handle(Command::SetModality(Modality::Fmri));
        assert_eq!(app.pipeline().state().selected_model(), Some(Model::Swift));

        app.handle(Command::SetTask(Some(Task::MciAd)));
        app.handle(Command::StartProcessing);
        assert_eq!(app.pipeline().state().active_stage(), Stage::Processing);

        let total = Config::default().progress_plan().total();
        app.advance(total - Duration::from_millis(1));
        assert!(!app.pipeline().state().is_complete());

        app.advance(Duration::from_millis(1));
        let state = app.pipeline().state();
        assert!(state.is_complete());
        assert!(!state.is_processing());
        assert_eq!(state.selected_task(), Some(Task::MciAd));
        assert_eq!(state.results().map(|r| r.score), Some(85.0));

        // Only the results count-up is left running
        let config = Config::default();
        assert_eq!(app.time_until_next(), Some(config.progress_tick));
        app.advance(config.count_up);
        assert_eq!(app.time_until_next(), None);
    }

    #[test]
    fn test_progress_events_precede_completion() {
        let (mut app, mut rx) = create_app();
        app.handle(Command::SetModality(Modality::Eeg));
        app.handle(Command::SetTask(Some(Task::MddDx)));
        app.handle(Command::StartProcessing);
        drain(&mut rx);

        app.advance(Duration::from_secs(60));
        let events = drain(&mut rx);

        let progress = events
            .iter()
            .filter(|e| matches!(e, DemoEvent::ProcessingProgress { .. }))
            .count();
        assert!(progress > 0);
        assert!(matches!(
            events.last(),
            Some(DemoEvent::ProcessingComplete { .. })
        ));
        match &events[events.len() - 2] {
            DemoEvent::ProcessingProgress { percents, .. } => {
                assert!(percents.iter().all(|p| *p == 100.0));
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_changing_modality_mid_run_cancels_processing() {
        let (mut app, mut rx) = create_app();
        app.handle(Command::SetModality(Modality::Fmri));
        app.handle(Command::SetTask(Some(Task::MciAd)));
        app.handle(Command::StartProcessing);
        app.advance(Duration::from_millis(1000));

        app.handle(Command::SetModality(Modality::Visual));
        drain(&mut rx);

        app.advance(Duration::from_secs(60));
        assert!(drain(&mut rx).is_empty());
        assert!(!app.pipeline().state().is_complete());
        assert_eq!(app.pipeline().state().selected_task(), None);
    }

    #[test]
    fn test_hero_auto_plays_scenes() {
        let (mut app, mut rx) = create_app();
        app.handle(Command::MountHero);
        assert_eq!(
            drain(&mut rx),
            vec![DemoEvent::SceneApplied {
                index: 0,
                scene: Scene::PowerUp
            }]
        );

        app.advance(DELAY);
        assert_eq!(
            drain(&mut rx),
            vec![DemoEvent::SceneApplied {
                index: 1,
                scene: Scene::RawInput
            }]
        );

        app.advance(DELAY * 5);
        let events = drain(&mut rx);
        assert_eq!(events.last(), Some(&DemoEvent::SceneSequenceComplete));

        app.advance(DELAY);
        assert_eq!(drain(&mut rx), vec![DemoEvent::SceneHandoff]);
    }

    #[test]
    fn test_keys_stop_auto_play() {
        let (mut app, mut rx) = create_app();
        app.handle(Command::MountHero);
        app.handle(Command::Key(NavKey::Right));
        app.handle(Command::Key(NavKey::Space));
        app.handle(Command::Key(NavKey::Left));

        let hero = app.hero().unwrap();
        assert_eq!(hero.state(), SequencerState::ManualPaused(1));

        app.handle(Command::Key(NavKey::Scene(42)));
        assert_eq!(app.hero().unwrap().cursor(), Scene::ALL.len() - 1);

        drain(&mut rx);
        app.advance(DELAY * 3);
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_unmount_mid_sequence_is_silent() {
        let (mut app, mut rx) = create_app();
        app.handle(Command::MountHero);
        app.advance(DELAY * 2 + DELAY / 2);
        assert_eq!(app.hero().unwrap().cursor(), 2);

        app.handle(Command::UnmountHero);
        drain(&mut rx);

        app.advance(DELAY * 2);
        assert!(drain(&mut rx).is_empty());
        assert_eq!(app.time_until_next(), None);
    }

    #[test]
    fn test_keys_without_hero_are_ignored() {
        let (mut app, mut rx) = create_app();
        app.handle(Command::Key(NavKey::Right));
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_intro_and_headline_emit_events() {
        let (mut app, mut rx) = create_app();
        app.handle(Command::PlayIntro);
        app.handle(Command::StartHeadline);

        app.advance(Duration::from_millis(100));
        let events = drain(&mut rx);
        assert!(events.contains(&DemoEvent::HeroCue {
            cue: crate::hero::HeroCue::DimOverlay
        }));
        assert!(events.contains(&DemoEvent::HeadlineChanged {
            text: "f".to_string()
        }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_runtime_drives_pipeline_to_completion() {
        let (event_tx, mut event_rx) = broadcast::channel(1024);
        let (command_tx, command_rx) = mpsc::channel(32);
        let config = Config::default();
        let total = config.progress_plan().total();

        let handle = tokio::spawn(DemoApp::new(config, event_tx).run(command_rx));

        tokio_test::assert_ok!(command_tx.send(Command::MountHero).await);
        tokio_test::assert_ok!(command_tx.send(Command::SetModality(Modality::Fmri)).await);
        tokio_test::assert_ok!(command_tx.send(Command::SetTask(Some(Task::MciAd))).await);
        tokio_test::assert_ok!(command_tx.send(Command::StartProcessing).await);

        tokio::time::sleep(total + Duration::from_millis(50)).await;

        let (reply_tx, reply_rx) = oneshot::channel();
        tokio_test::assert_ok!(command_tx.send(Command::Snapshot(reply_tx)).await);
        let snapshot = tokio_test::assert_ok!(reply_rx.await);
        assert!(snapshot.is_complete);
        assert_eq!(snapshot.task, Some(Task::MciAd));
        assert_eq!(snapshot.stage, Stage::Results);

        let events = drain(&mut event_rx);
        assert!(events.contains(&DemoEvent::SceneApplied {
            index: 0,
            scene: Scene::PowerUp
        }));
        assert!(events
            .iter()
            .any(|e| matches!(e, DemoEvent::ProcessingComplete { .. })));

        drop(command_tx);
        tokio_test::assert_ok!(handle.await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_runtime_unmount_stops_scene_timers() {
        let (event_tx, mut event_rx) = broadcast::channel(1024);
        let (command_tx, command_rx) = mpsc::channel(32);
        let handle = tokio::spawn(DemoApp::new(Config::default(), event_tx).run(command_rx));

        tokio_test::assert_ok!(command_tx.send(Command::MountHero).await);
        tokio::time::sleep(DELAY + DELAY / 2).await;
        tokio_test::assert_ok!(command_tx.send(Command::UnmountHero).await);

        // Let the unmount land before draining
        tokio::time::sleep(Duration::from_millis(1)).await;
        let before = drain(&mut event_rx);
        assert!(before.contains(&DemoEvent::SceneApplied {
            index: 1,
            scene: Scene::RawInput
        }));

        tokio::time::sleep(DELAY * 2).await;
        assert!(drain(&mut event_rx).is_empty());

        drop(command_tx);
        tokio_test::assert_ok!(handle.await);
    }

    #[test]
    fn test_results_count_up_after_completion() {
        let (mut app, mut rx) = create_app();
        let config = Config::default();
        app.handle(Command::SetModality(Modality::Fmri));
        app.handle(Command::SetTask(Some(Task::MciAd)));
        app.handle(Command::StartProcessing);

        app.advance(config.progress_plan().total());
        let events = drain(&mut rx);
        assert!(matches!(
            events.last(),
            Some(DemoEvent::ProcessingComplete { .. })
        ));

        app.advance(config.count_up);
        let events = drain(&mut rx);
        let scores: Vec<f64> = events
            .iter()
            .filter_map(|e| match e {
                DemoEvent::ResultsCountUp { score, .. } => Some(*score),
                _ => None,
            })
            .collect();

        // One frame per tick, the last one at the final value
        let ticks = (config.count_up.as_millis() / config.progress_tick.as_millis()) as usize;
        assert_eq!(scores.len(), ticks);
        assert!(scores.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(scores.last(), Some(&85.0));
        assert_eq!(
            events.last(),
            Some(&DemoEvent::ResultsReady { task: Task::MciAd })
        );
    }

    #[test]
    fn test_changing_task_cancels_count_up() {
        let (mut app, mut rx) = create_app();
        let config = Config::default();
        app.handle(Command::SetModality(Modality::Eeg));
        app.handle(Command::SetTask(Some(Task::MddDx)));
        app.handle(Command::StartProcessing);
        app.advance(config.progress_plan().total());
        app.advance(config.progress_tick);

        app.handle(Command::SetTask(Some(Task::OcdDx)));
        drain(&mut rx);

        app.advance(config.count_up * 2);
        assert!(drain(&mut rx).is_empty());
        assert_eq!(app.time_until_next(), None);
    }

    #[test]
    fn test_restart_key_remounts_hero() {
        let (mut app, mut rx) = create_app();
        app.handle(Command::MountHero);
        app.handle(Command::UnmountHero);
        assert!(app.hero().is_none());
        drain(&mut rx);

        app.handle(Command::Key(NavKey::Restart));
        assert_eq!(
            drain(&mut rx),
            vec![DemoEvent::SceneApplied {
                index: 0,
                scene: Scene::PowerUp
            }]
        );
        assert_eq!(
            app.hero().map(|h| h.state()),
            Some(SequencerState::AutoPlaying(0))
        );
    }

    #[test]
    fn test_progress_and_headline_events_are_broadcast() {
        let (mut app, mut rx) = create_app();
        app.handle(Command::StartHeadline);
        app.handle(Command::SetModality(Modality::Fmri));
        app.handle(Command::SetTask(Some(Task::MciAd)));
        app.handle(Command::StartProcessing);
        drain(&mut rx);

        app.advance(Duration::from_millis(100));
        let events = drain(&mut rx);
        assert!(events.contains(&DemoEvent::HeadlineChanged {
            text: "f".to_string()
        }));
        assert!(events.iter().any(|e| matches!(
            e,
            DemoEvent::ProcessingProgress {
                elapsed_ms: 100,
                active_step: Some(0),
                ..
            }
        )));
    }

    /// Reader that blocks like a terminal nobody types into
    struct ParkedReader(std_mpsc::Receiver<()>);

    impl Read for ParkedReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            let _ = self.0.recv();
            Ok(0)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_runtime_stops_while_listener_is_parked() {
        let (event_tx, _event_rx) = broadcast::channel(64);
        let (command_tx, command_rx) = mpsc::channel(32);
        let handle = tokio::spawn(DemoApp::new(Config::default(), event_tx).run(command_rx));

        let (release, parked) = std_mpsc::channel::<()>();
        let reader = BufReader::new(ParkedReader(parked));
        tokio_test::assert_ok!(InputListener::new(command_tx.clone()).spawn_reader(reader));

        tokio_test::assert_ok!(command_tx.send(Command::MountHero).await);
        tokio_test::assert_ok!(command_tx.send(Command::Shutdown).await);
        drop(command_tx);

        // The listener thread still holds a sender
        let stopped = tokio::time::timeout(Duration::from_secs(5), handle).await;
        tokio_test::assert_ok!(tokio_test::assert_ok!(stopped));

        drop(release);
    }
}
