use super::SchedulerSignal;

/// Receives scheduler signals as they are produced.
///
/// Handlers run under the scheduler's internal serialization, so they must
/// not call back into the scheduler and should return quickly.
pub trait SignalHandler {
    fn handle_signal(&mut self, signal: &SchedulerSignal);
}
