/// Events emitted while stepping the scene.
/// The presentation layer (and the tests) consume these.

#[derive(Clone, Debug, PartialEq)]
#[allow(dead_code)]
pub enum SceneEvent {
    WaveLaunched { count: usize },
    ShellBurst { total: u32 },
    /// The greeting container became visible (burst number four).
    GreetingShown,
    /// 500ms later: emphasis applied, emojis bouncing, photos started.
    GreetingRevealed,
    IntroPhotoPlaced,
    LoopPhotoPlaced { index: usize },
    FinalPhotoPlaced,
    MusicStarted,
    MusicBlocked,
    MusicEnded,
    ReplayOffered,
}
