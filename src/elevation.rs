//! Optional privilege elevation. Games often run elevated on Windows, and
//! synthetic input from a lower integrity level is dropped there. Nothing
//! else in the crate depends on the outcome.

use crate::error::ElevationError;

#[derive(Debug, Clone, PartialEq)]
pub enum ElevationOutcome {
    AlreadyElevated,
    /// An elevated copy was started; this process should exit.
    Relaunched,
    Unsupported,
    Failed(ElevationError),
}

pub trait Elevation {
    fn supported(&self) -> bool;
    fn is_elevated(&self) -> bool;
    fn relaunch_elevated(&self, args: &[String]) -> Result<(), ElevationError>;
}

/// Quotes each argument for the relaunched command line.
pub fn quote_args(args: &[String]) -> String {
    args.iter()
        .map(|arg| format!("\"{}\"", arg.replace('"', "\\\"")))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn ensure_elevated(elevation: &dyn Elevation, args: &[String]) -> ElevationOutcome {
    if !elevation.supported() {
        tracing::info!("privilege elevation is not available on this platform");
        return ElevationOutcome::Unsupported;
    }
    if elevation.is_elevated() {
        tracing::info!("already running with elevated privileges");
        return ElevationOutcome::AlreadyElevated;
    }

    tracing::info!("attempting to relaunch with elevated privileges");
    match elevation.relaunch_elevated(args) {
        Ok(()) => {
            tracing::info!("relaunched with elevated privileges");
            ElevationOutcome::Relaunched
        }
        Err(err) => {
            tracing::warn!(error = %err, "elevation failed, continuing unelevated");
            ElevationOutcome::Failed(err)
        }
    }
}

#[cfg(windows)]
pub struct WindowsElevation;

#[cfg(windows)]
impl Elevation for WindowsElevation {
    fn supported(&self) -> bool {
        true
    }

    fn is_elevated(&self) -> bool {
        unsafe { windows::Win32::UI::Shell::IsUserAnAdmin().as_bool() }
    }

    fn relaunch_elevated(&self, args: &[String]) -> Result<(), ElevationError> {
        use windows::core::{w, HSTRING, PCWSTR};
        use windows::Win32::Foundation::HWND;
        use windows::Win32::UI::Shell::ShellExecuteW;
        use windows::Win32::UI::WindowsAndMessaging::SW_SHOWNORMAL;

        let exe = std::env::current_exe().map_err(|e| ElevationError::CurrentExe(e.to_string()))?;
        let file = HSTRING::from(exe.as_os_str());
        let params = HSTRING::from(quote_args(args));

        let instance = unsafe {
            ShellExecuteW(
                HWND::default(),
                w!("runas"),
                &file,
                &params,
                PCWSTR::null(),
                SW_SHOWNORMAL,
            )
        };
        // values above 32 mean success
        let code = instance.0 as isize;
        if code > 32 {
            Ok(())
        } else {
            Err(ElevationError::RelaunchFailed(code))
        }
    }
}

#[cfg(not(windows))]
pub struct NoElevation;

#[cfg(not(windows))]
impl Elevation for NoElevation {
    fn supported(&self) -> bool {
        false
    }

    fn is_elevated(&self) -> bool {
        false
    }

    fn relaunch_elevated(&self, _args: &[String]) -> Result<(), ElevationError> {
        Err(ElevationError::RelaunchFailed(0))
    }
}

pub fn platform() -> Box<dyn Elevation> {
    #[cfg(windows)]
    {
        Box::new(WindowsElevation)
    }
    #[cfg(not(windows))]
    {
        Box::new(NoElevation)
    }
}
