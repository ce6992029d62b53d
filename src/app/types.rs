/// Component lifecycle states
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentState {
    Stopped,
    Running,
    Failed,
}

/// System shutdown reason
#[derive(Debug, Clone, PartialEq)]
pub enum ShutdownReason {
    Signal(String),
    Error(String),
}

/// Parts of the service with a tracked lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    Camera,
    Locker,
    Server,
}
