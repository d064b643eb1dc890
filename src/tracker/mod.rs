//! The tracking side: the countdown [timer::Timer], its tick schedule, the
//! [session::TimerSession] tying both to the [storage::record_store::RecordStore].

pub mod session;
pub mod shutdown;
pub mod storage;
pub mod ticker;
pub mod timer;
