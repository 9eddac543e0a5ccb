/// A boolean flag together with the counter it contributes to, like a comment's like state
/// and like count, or a creator's follow state and follower count.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Toggle {
    pub on: bool,
    pub count: u64,
}

impl Toggle {
    pub fn new(on: bool, count: u64) -> Toggle {
        Toggle { on, count }
    }

    /// The opposite state, with the counter moved by one, saturating at both ends
    pub fn flipped(self) -> Toggle {
        match self.on {
            true => Toggle {
                on: false,
                count: self.count.saturating_sub(1),
            },
            false => Toggle {
                on: true,
                count: self.count.saturating_add(1),
            },
        }
    }
}

/// An optimistic toggle that was applied locally and awaits the server's answer.
///
/// Each toggle is computed from the state current when it began, so a second toggle may start
/// while the first is in flight. Settling only touches the state if it still shows this
/// toggle's result: otherwise a newer toggle owns it and the last local state wins.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Pending<K> {
    pub key: K,

    /// Load generation this toggle was started in
    pub generation: u64,

    pub before: Toggle,
    pub after: Toggle,
}

impl<K> Pending<K> {
    pub fn begin(key: K, generation: u64, current: Toggle) -> Pending<K> {
        Pending {
            key,
            generation,
            before: current,
            after: current.flipped(),
        }
    }

    /// Whether the request to send is the one turning the flag on
    pub fn turns_on(&self) -> bool {
        self.after.on
    }

    /// State to restore after the request failed
    pub fn reverted(&self, current: Toggle) -> Option<Toggle> {
        (current == self.after).then_some(self.before)
    }

    /// State to adopt after the request succeeded, given the counter the server reported
    pub fn confirmed(&self, current: Toggle, server_count: Option<u64>) -> Option<Toggle> {
        (current == self.after).then(|| Toggle {
            on: self.after.on,
            count: server_count.unwrap_or(self.after.count),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flip_and_revert_restores() {
        bolero::check!()
            .with_type::<(bool, u64)>()
            .cloned()
            .for_each(|(on, count)| {
                let initial = Toggle::new(on, count);
                let pending = Pending::begin((), 0, initial);
                assert_eq!(pending.after.on, !on);
                assert_eq!(pending.reverted(pending.after), Some(initial));
            })
    }

    #[test]
    fn counter_saturates() {
        assert_eq!(Toggle::new(true, 0).flipped(), Toggle::new(false, 0));
        assert_eq!(Toggle::new(false, 0).flipped(), Toggle::new(true, 1));
    }

    #[test]
    fn newer_toggle_wins() {
        let initial = Toggle::new(false, 5);
        let first = Pending::begin("c", 0, initial);
        let second = Pending::begin("c", 0, first.after);
        // second toggle already brought the state back to `initial`
        assert_eq!(first.reverted(second.after), None);
        assert_eq!(first.confirmed(second.after, Some(6)), None);
        assert_eq!(
            second.confirmed(second.after, Some(5)),
            Some(Toggle::new(false, 5))
        );
        assert_eq!(
            first.confirmed(first.after, Some(9)),
            Some(Toggle::new(true, 9))
        );
    }
}
