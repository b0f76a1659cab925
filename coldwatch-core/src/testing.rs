//! Test doubles shared by the unit tests

use coldwatch_at::{AtClient, ResponsePolicy, TransmitState, TransportError, RX_BUFFER_SIZE};
use heapless::{Deque, String, Vec};

/// Client that records every command and answers from a script
///
/// An exhausted script answers `Completed`. Scripted errors are returned
/// in turn with the outcomes.
#[derive(Default)]
pub struct FakeModem {
    pub sent: Vec<String<255>, 32>,
    outcomes: Deque<Result<TransmitState, TransportError>, 32>,
}

impl FakeModem {
    pub fn answering(outcomes: &[TransmitState]) -> Self {
        let mut modem = Self::default();
        modem.script(outcomes);
        modem
    }

    /// Queue further answers
    pub fn script(&mut self, outcomes: &[TransmitState]) {
        for &o in outcomes {
            self.outcomes.push_back(Ok(o)).unwrap();
        }
    }

    /// Queue an error in place of an answer
    pub fn fail(&mut self, error: TransportError) {
        self.outcomes.push_back(Err(error)).unwrap();
    }

    pub fn sent(&self) -> Vec<&str, 32> {
        self.sent.iter().map(|s| s.as_str()).collect()
    }
}

impl AtClient for FakeModem {
    fn send(
        &mut self,
        command: &[u8],
        _policy: ResponsePolicy,
    ) -> Result<TransmitState, TransportError> {
        let mut line = String::new();
        line.push_str(core::str::from_utf8(command).unwrap()).unwrap();
        self.sent.push(line).unwrap();
        self.outcomes.pop_front().unwrap_or(Ok(TransmitState::Completed))
    }

    fn last_response(&self, _max_len: usize) -> Vec<u8, RX_BUFFER_SIZE> {
        Vec::new()
    }
}
