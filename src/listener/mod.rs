mod receive_loops;
mod shutdown;

pub(crate) use receive_loops::ServerListener;
pub(crate) use shutdown::shutdown_signal;
pub(crate) use shutdown::ListenerShutdownHandle;
pub(crate) use shutdown::ListenerShutdownSignal;
