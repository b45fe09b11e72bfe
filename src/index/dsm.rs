//! Time windows for demand-side management.
use crate::dsm::DsmResource;
use crate::time::{TimeInfo, Timestep};
use std::ops::RangeInclusive;

/// The time windows of a DSM resource over the modelled timesteps
#[derive(Debug, Clone, PartialEq)]
pub struct DsmWindows {
    delay: u32,
    recovery: u32,
    modelled: RangeInclusive<Timestep>,
}

impl DsmWindows {
    /// Create the windows for a DSM resource.
    ///
    /// # Arguments
    ///
    /// * `resource` - The DSM resource
    /// * `time` - The modelled timesteps
    pub fn new(resource: &DsmResource, time: &TimeInfo) -> Self {
        Self {
            delay: resource.delay,
            recovery: resource.recovery,
            modelled: (time.initial() + 1)..=time.last(),
        }
    }

    fn clip(&self, range: RangeInclusive<Timestep>) -> RangeInclusive<Timestep> {
        (*range.start()).max(*self.modelled.start())..=(*range.end()).min(*self.modelled.end())
    }

    /// Timesteps at which an upward shift at `t` may be compensated: `(t, t + delay]`
    pub fn down(&self, t: Timestep) -> RangeInclusive<Timestep> {
        self.clip((t + 1)..=t.saturating_add(self.delay))
    }

    /// Timesteps whose upward shifts may be compensated at `tt`: `[tt - delay, tt)`
    pub fn incoming(&self, tt: Timestep) -> RangeInclusive<Timestep> {
        self.clip(tt.saturating_sub(self.delay)..=tt.saturating_sub(1))
    }

    /// Timesteps over which cumulative upward shifts starting after `t` are limited:
    /// `(t, t + recovery]`
    pub fn recovery(&self, t: Timestep) -> RangeInclusive<Timestep> {
        self.clip((t + 1)..=t.saturating_add(self.recovery))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::Itertools;
    use rstest::{fixture, rstest};

    #[fixture]
    fn windows() -> DsmWindows {
        let resource = DsmResource {
            delay: 2,
            recovery: 3,
            eff: 1.0,
            cap_max_up: 10.0,
            cap_max_down: 10.0,
        };
        let time = TimeInfo::new((0..=6).collect(), 1.0).unwrap();
        DsmWindows::new(&resource, &time)
    }

    #[rstest]
    #[case(1, vec![2, 3])]
    #[case(5, vec![6])]
    #[case(6, vec![])]
    fn test_down(windows: DsmWindows, #[case] t: Timestep, #[case] expected: Vec<Timestep>) {
        assert_eq!(windows.down(t).collect_vec(), expected);
    }

    #[rstest]
    #[case(1, vec![])]
    #[case(2, vec![1])]
    #[case(4, vec![2, 3])]
    fn test_incoming(windows: DsmWindows, #[case] tt: Timestep, #[case] expected: Vec<Timestep>) {
        assert_eq!(windows.incoming(tt).collect_vec(), expected);
    }

    #[rstest]
    fn test_down_and_incoming_agree(windows: DsmWindows) {
        for t in 1..=6 {
            for tt in windows.down(t) {
                assert!(windows.incoming(tt).contains(&t));
            }
        }
    }

    #[rstest]
    fn test_recovery(windows: DsmWindows) {
        assert_eq!(windows.recovery(1).collect_vec(), [2, 3, 4]);
        assert_eq!(windows.recovery(5).collect_vec(), [6]);
    }
}
