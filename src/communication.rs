use crate::{
    alarm::{AlarmId, AlarmRecord},
    schedule::Notification,
};

/// sent from the gui to the scheduler thread
#[derive(Debug, Clone)]
pub enum Message {
    // trigger worked out by the scheduler when it receives the alarm
    ScheduleAlarm(AlarmRecord),
    Schedule(Notification),
    // if the alarm is disabled/removed
    Cancel(AlarmId),
    // silence a ringing alarm
    Stop(AlarmId),
}

/// sent from the scheduler thread back to the gui
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Ringing {
        id: AlarmId,
        title: String,
        body: String,
    },
    Failed {
        id: AlarmId,
        reason: String,
    },
}
