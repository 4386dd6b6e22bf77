/// A boolean connectivity signal that may flip at any time. Callers poll
/// it to choose between online and offline mutation variants; nothing
/// ever blocks on it.
pub trait ConnectivitySignal: Send + Sync {
    fn is_online(&self) -> bool;
}
