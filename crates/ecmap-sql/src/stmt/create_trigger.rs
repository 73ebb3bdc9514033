use super::{Name, Statement};

use ecmap_core::schema::db::{TableId, Trigger, TriggerEvent, TriggerTiming};

#[derive(Debug, Clone)]
pub struct CreateTrigger {
    pub name: Name,

    /// Table the trigger fires on
    pub on: TableId,

    pub timing: TriggerTiming,
    pub event: TriggerEvent,

    /// `WHEN` condition
    pub condition: Option<String>,

    /// Statements between `BEGIN` and `END`, each terminated by `;`
    pub body: String,
}

impl Statement {
    pub fn create_trigger(on: TableId, trigger: &Trigger) -> Self {
        CreateTrigger {
            name: Name::from(&trigger.name),
            on,
            timing: trigger.timing,
            event: trigger.event,
            condition: trigger.condition.clone(),
            body: trigger.body.clone(),
        }
        .into()
    }
}

impl From<CreateTrigger> for Statement {
    fn from(value: CreateTrigger) -> Self {
        Self::CreateTrigger(value)
    }
}
