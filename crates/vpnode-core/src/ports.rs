//! Management-port allocation.
//!
//! Every server process gets a local management socket. Its port is derived
//! by packing the (instance, profile, process) coordinates into a fixed-width
//! offset above [`MANAGEMENT_PORT_BASE`], so no two processes in a deployment
//! can collide as long as the coordinates stay within the bit budget.
//!
//! Budget: 3 bits instance, 6 bits profile, 6 bits process. The highest
//! offset is 32767, keeping every management port below 65536. Coordinates
//! outside the budget are rejected, never wrapped: a wrapped offset would
//! silently alias another process's management socket.

use crate::error::CoreError;

/// Base added to the packed offset to form the advertised port.
pub const MANAGEMENT_PORT_BASE: u16 = 11940;

const PROFILE_BITS: u16 = 6;
const PROCESS_BITS: u16 = 6;

/// Highest instance number the port budget can address.
pub const MAX_INSTANCE_NUMBER: u16 = 8;
/// Highest profile number the port budget can address.
pub const MAX_PROFILE_NUMBER: u16 = 1 << PROFILE_BITS;
/// Highest process index the port budget can address (exclusive bound is 64).
pub const MAX_PROCESS_NUMBER: u16 = (1 << PROCESS_BITS) - 1;

/// Pack (instance, profile, process) coordinates into a port offset.
///
/// Injective for all in-budget coordinates: `allocate(1, 1, 0) == 0`.
pub fn allocate(instance: u16, profile: u16, process: u16) -> Result<u16, CoreError> {
    if instance == 0 || instance > MAX_INSTANCE_NUMBER {
        return Err(CoreError::PortBudgetExceeded {
            field: "instanceNumber",
            value: instance,
            max: MAX_INSTANCE_NUMBER,
        });
    }
    if profile == 0 || profile > MAX_PROFILE_NUMBER {
        return Err(CoreError::PortBudgetExceeded {
            field: "profileNumber",
            value: profile,
            max: MAX_PROFILE_NUMBER,
        });
    }
    if process > MAX_PROCESS_NUMBER {
        return Err(CoreError::PortBudgetExceeded {
            field: "processNumber",
            value: process,
            max: MAX_PROCESS_NUMBER,
        });
    }

    Ok(((instance - 1) << (PROFILE_BITS + PROCESS_BITS)) | ((profile - 1) << PROCESS_BITS) | process)
}

/// Management port advertised in the server config.
pub fn management_port(instance: u16, profile: u16, process: u16) -> Result<u16, CoreError> {
    Ok(MANAGEMENT_PORT_BASE + allocate(instance, profile, process)?)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::collections::HashSet;

    use super::*;

    #[test]
    fn first_coordinate_is_base_port() {
        assert_eq!(allocate(1, 1, 0).unwrap(), 0);
        assert_eq!(management_port(1, 1, 0).unwrap(), 11940);
    }

    #[test]
    fn allocation_is_injective_over_full_budget() {
        let mut seen = HashSet::new();
        for instance in 1..=MAX_INSTANCE_NUMBER {
            for profile in 1..=MAX_PROFILE_NUMBER {
                for process in 0..=MAX_PROCESS_NUMBER {
                    let offset = allocate(instance, profile, process).unwrap();
                    assert!(
                        seen.insert(offset),
                        "collision at ({instance}, {profile}, {process})"
                    );
                }
            }
        }
        assert_eq!(seen.len(), 8 * 64 * 64);
    }

    #[test]
    fn highest_coordinate_stays_below_port_ceiling() {
        let port = management_port(MAX_INSTANCE_NUMBER, MAX_PROFILE_NUMBER, MAX_PROCESS_NUMBER)
            .unwrap();
        assert_eq!(port, 11940 + 32767);
    }

    #[test]
    fn out_of_budget_coordinates_are_rejected() {
        assert!(allocate(0, 1, 0).is_err());
        assert!(allocate(9, 1, 0).is_err());
        assert!(allocate(1, 0, 0).is_err());
        assert!(allocate(1, 65, 0).is_err());
        assert!(matches!(
            allocate(1, 1, 64),
            Err(CoreError::PortBudgetExceeded {
                field: "processNumber",
                value: 64,
                max: 63,
            })
        ));
    }
}
