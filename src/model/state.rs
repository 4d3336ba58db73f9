/// The latest value of an entity which still has to be sent.
///
/// Anything other than [`State::Empty`] is "dirty". A successful publish clears the state again,
/// a failed one leaves it in place so that the next cycle retries.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum State {
    #[default]
    Empty,
    Text(String),
    Binary(Vec<u8>),
}

impl State {
    pub fn set_text(&mut self, value: impl Into<String>) {
        *self = Self::Text(value.into());
    }

    pub fn set_binary(&mut self, value: impl Into<Vec<u8>>) {
        *self = Self::Binary(value.into());
    }

    /// Drop the current value, releasing any buffer.
    pub fn clear(&mut self) {
        *self = Self::Empty;
    }

    pub fn is_dirty(&self) -> bool {
        !matches!(self, Self::Empty)
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, Self::Binary(_))
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn binary(&self) -> Option<&[u8]> {
        match self {
            Self::Binary(data) => Some(data),
            _ => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_new_is_clean() {
        let state = State::default();
        assert!(!state.is_dirty());
        assert!(!state.is_binary());
    }

    #[test]
    fn test_text_then_binary() {
        let mut state = State::default();
        state.set_text("ON");
        assert!(state.is_dirty());
        assert_eq!(state.text(), Some("ON"));

        state.set_binary(vec![1u8, 2, 3]);
        assert!(state.is_dirty());
        assert!(state.is_binary());
        assert_eq!(state.binary(), Some(&[1u8, 2, 3][..]));
        assert_eq!(state.text(), None);
    }

    #[test]
    fn test_binary_then_text() {
        let mut state = State::default();
        state.set_binary(b"\x00\xff".to_vec());
        state.set_text("OFF");
        assert!(!state.is_binary());
        assert_eq!(state.binary(), None);
        assert_eq!(state.text(), Some("OFF"));
    }

    #[test]
    fn test_clear() {
        let mut state = State::default();
        state.set_binary(vec![0u8; 16]);
        state.clear();
        assert_eq!(state, State::Empty);
        assert!(!state.is_dirty());

        // reusable afterwards
        state.set_text("again");
        assert!(state.is_dirty());
    }
}
