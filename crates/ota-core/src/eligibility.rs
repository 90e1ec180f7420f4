//! The update eligibility decision.

use crate::catalog::UpdateCatalog;
use crate::types::{DeviceInfo, EligibilityResult, UpdateInfo};

/// Decides whether `device` should be offered an update.
///
/// The decision is driven purely by build-number comparison scoped to the
/// device's platform: the newest active record with a build number above
/// the device's wins. `min_required_version` is carried in the record but
/// plays no part here.
pub fn check(device: &DeviceInfo, catalog: &UpdateCatalog) -> EligibilityResult {
    match catalog.latest_for_platform(device.platform, device.build_number) {
        Some(record) => EligibilityResult {
            has_update: true,
            update_info: Some(UpdateInfo::from(&record)),
        },
        None => EligibilityResult {
            has_update: false,
            update_info: None,
        },
    }
}
