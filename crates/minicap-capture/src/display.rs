//! Active display mode lookup.

use minicap_core::{CaptureError, DisplayInfo};
use tracing::{debug, error};

use crate::compositor::Compositor;

/// Query the compositor for the active mode of `display_id`.
///
/// Point-in-time: nothing is cached and failures are not retried.
pub fn resolve_display_info(
    compositor: &dyn Compositor,
    display_id: i32,
) -> Result<DisplayInfo, CaptureError> {
    let handle = compositor.resolve_display_handle(display_id).map_err(|status| {
        error!("Unable to get handle for display {}: {}", display_id, status);
        CaptureError::Resolution { display_id, status }
    })?;

    let configs = compositor.display_configs(&handle).map_err(|status| {
        error!("display_configs() failed: {}", status);
        CaptureError::Query { call: "display_configs", status }
    })?;

    let active = compositor.active_config(&handle);
    let config = usize::try_from(active)
        .ok()
        .and_then(|i| configs.get(i))
        .ok_or_else(|| {
            error!("Active config {} not inside configs (size {})", active, configs.len());
            CaptureError::Index { index: active, count: configs.len() }
        })?;

    let info = DisplayInfo {
        width:       config.width,
        height:      config.height,
        orientation: config.orientation,
        fps:         config.fps,
        density:     config.density,
        xdpi:        config.xdpi,
        ydpi:        config.ydpi,
        secure:      config.secure,
        size:        DisplayInfo::diagonal_inches(config.width, config.height, config.xdpi, config.ydpi),
    };
    debug!(
        "Display[{}] {}x{} rot={} @{}fps density={} size={:.2}in",
        display_id, info.width, info.height, info.orientation.degrees(), info.fps, info.density, info.size
    );
    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::DisplayConfig;
    use crate::mock::{phone_config, MockCompositor};
    use minicap_core::{Orientation, Status};

    #[test]
    fn resolves_active_mode() {
        let mock = MockCompositor::phone();
        let info = resolve_display_info(&mock, 0).expect("display info");
        assert_eq!((info.width, info.height), (1080, 1920));
        assert_eq!(info.density, 2.75);
        assert_eq!(info.orientation, Orientation::Deg0);
        assert!(info.secure);
        assert!((info.size - 5.50).abs() < 0.01, "size={}", info.size);
    }

    #[test]
    fn picks_the_active_index() {
        let landscape = DisplayConfig { width: 1920, height: 1080, orientation: Orientation::Deg90, ..phone_config() };
        let mock = MockCompositor::new(0, vec![phone_config(), landscape], 1);
        let info = resolve_display_info(&mock, 0).expect("display info");
        assert_eq!(info.width, 1920);
        assert_eq!(info.orientation, Orientation::Deg90);
    }

    #[test]
    fn index_equal_to_len_is_rejected() {
        let mock = MockCompositor::phone();
        mock.set_active(1);
        let err = resolve_display_info(&mock, 0).unwrap_err();
        assert_eq!(err, CaptureError::Index { index: 1, count: 1 });
        assert_eq!(err.status(), Status::BAD_VALUE);
    }

    #[test]
    fn negative_index_is_rejected() {
        let mock = MockCompositor::phone();
        mock.set_active(-1);
        assert!(matches!(resolve_display_info(&mock, 0), Err(CaptureError::Index { index: -1, .. })));
    }

    #[test]
    fn empty_config_list_is_rejected() {
        let mock = MockCompositor::new(0, Vec::new(), 0);
        assert_eq!(
            resolve_display_info(&mock, 0).unwrap_err(),
            CaptureError::Index { index: 0, count: 0 }
        );
    }

    #[test]
    fn unknown_display_is_resolution_error() {
        let mock = MockCompositor::phone();
        let err = resolve_display_info(&mock, 7).unwrap_err();
        assert_eq!(err, CaptureError::Resolution { display_id: 7, status: Status::NAME_NOT_FOUND });
        assert_eq!(mock.calls().configs, 0);
    }

    #[test]
    fn config_query_failure_is_forwarded() {
        let mock = MockCompositor::phone();
        mock.fail_configs(Some(Status::DEAD_OBJECT));
        let err = resolve_display_info(&mock, 0).unwrap_err();
        assert_eq!(err.status(), Status::DEAD_OBJECT);
        assert!(matches!(err, CaptureError::Query { call: "display_configs", .. }));
        assert_eq!(mock.calls().active, 0);
    }
}
