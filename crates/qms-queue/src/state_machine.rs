//! 叫号记录状态机
//!
//! 管理审计记录从登记到完成/转诊的状态转换

use qms_core::{CallStatus, QmsError, Result};
use std::collections::HashMap;

/// 叫号状态转换事件
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CallEvent {
    Call,
    Complete,
    Transfer,
}

/// 叫号状态机
#[derive(Debug)]
pub struct CallStateMachine {
    transitions: HashMap<(CallStatus, CallEvent), CallStatus>,
}

impl CallStateMachine {
    /// 创建新的状态机实例
    pub fn new() -> Self {
        let mut transitions = HashMap::new();

        // 定义状态转换规则
        transitions.insert((CallStatus::Pending, CallEvent::Call), CallStatus::Called);
        transitions.insert((CallStatus::Called, CallEvent::Complete), CallStatus::Completed);
        transitions.insert((CallStatus::Called, CallEvent::Transfer), CallStatus::Transferred);
        transitions.insert((CallStatus::Pending, CallEvent::Transfer), CallStatus::Transferred);

        Self { transitions }
    }

    /// 检查状态转换是否有效
    pub fn can_transition(&self, from: &CallStatus, event: &CallEvent) -> bool {
        self.transitions.contains_key(&(from.clone(), event.clone()))
    }

    /// 执行状态转换
    pub fn transition(&self, from: &CallStatus, event: &CallEvent) -> Result<CallStatus> {
        match self.transitions.get(&(from.clone(), event.clone())) {
            Some(to) => Ok(to.clone()),
            None => Err(QmsError::InvalidStateTransition {
                from: format!("{:?}", from),
                event: format!("{:?}", event),
            }),
        }
    }

    /// 获取状态的所有可能事件
    pub fn possible_events(&self, current: &CallStatus) -> Vec<CallEvent> {
        self.transitions
            .keys()
            .filter(|(state, _)| state == current)
            .map(|(_, event)| event.clone())
            .collect()
    }
}

impl Default for CallStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_transitions() {
        let sm = CallStateMachine::new();

        assert!(sm.can_transition(&CallStatus::Pending, &CallEvent::Call));
        assert!(sm.can_transition(&CallStatus::Called, &CallEvent::Complete));
        assert!(sm.can_transition(&CallStatus::Called, &CallEvent::Transfer));
    }

    #[test]
    fn test_invalid_transitions() {
        let sm = CallStateMachine::new();

        assert!(!sm.can_transition(&CallStatus::Completed, &CallEvent::Call));
        assert!(!sm.can_transition(&CallStatus::Transferred, &CallEvent::Complete));
    }

    #[test]
    fn test_transition_execution() {
        let sm = CallStateMachine::new();

        let result = sm.transition(&CallStatus::Called, &CallEvent::Complete);
        assert_eq!(result.unwrap(), CallStatus::Completed);

        let result = sm.transition(&CallStatus::Completed, &CallEvent::Transfer);
        assert!(result.is_err());
    }
}
