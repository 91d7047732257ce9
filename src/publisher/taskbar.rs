//! Taskbar progress overlay via ITaskbarList3
//!
//! Drives the Windows 7+ taskbar-button progress bar: `SetProgressState`
//! toggles the overlay, `SetProgressValue` moves it. Both calls target the
//! process's top-level window, resolved once at initialization.

use super::{ProgressPublisher, PublishError};
use crate::aggregate::Aggregate;
use windows::Win32::Foundation::HWND;
use windows::Win32::System::Com::{
    CoCreateInstance, CoInitializeEx, CLSCTX_ALL, COINIT_APARTMENTTHREADED,
};
use windows::Win32::UI::Shell::{ITaskbarList3, TaskbarList, TBPF_NOPROGRESS, TBPF_NORMAL};
use windows::Win32::UI::WindowsAndMessaging::{
    GetActiveWindow, GetForegroundWindow, GetWindowThreadProcessId,
};

pub(crate) struct TaskbarOverlayPublisher {
    taskbar: ITaskbarList3,
    // Stored raw so the publisher stays Send inside the process-wide lock.
    window: isize,
}

impl TaskbarOverlayPublisher {
    fn window(&self) -> HWND {
        HWND(self.window as *mut core::ffi::c_void)
    }
}

/// A top-level window belonging to this process, if one exists yet.
///
/// Prefers the calling thread's active window and falls back to the
/// foreground window when that also belongs to us (the common case when the
/// host initializes progress reporting from its UI thread).
fn own_top_level_window() -> Option<HWND> {
    let active = unsafe { GetActiveWindow() };
    if !active.is_invalid() {
        return Some(active);
    }
    let foreground = unsafe { GetForegroundWindow() };
    if foreground.is_invalid() {
        return None;
    }
    let mut owner_pid = 0u32;
    unsafe { GetWindowThreadProcessId(foreground, Some(&mut owner_pid)) };
    (owner_pid == std::process::id()).then_some(foreground)
}

impl ProgressPublisher for TaskbarOverlayPublisher {
    fn initialize() -> Result<Self, PublishError> {
        let Some(window) = own_top_level_window() else {
            return Err(PublishError::IdentityUnavailable);
        };
        // S_FALSE (already initialized) and RPC_E_CHANGED_MODE are both fine
        // here; CoCreateInstance fails on its own if COM is truly unusable.
        unsafe {
            let _ = CoInitializeEx(None, COINIT_APARTMENTTHREADED);
        }
        let taskbar: ITaskbarList3 = unsafe { CoCreateInstance(&TaskbarList, None, CLSCTX_ALL)? };
        unsafe { taskbar.HrInit()? };
        Ok(TaskbarOverlayPublisher {
            taskbar,
            window: window.0 as isize,
        })
    }

    fn publish(&mut self, aggregate: Aggregate) -> Result<(), PublishError> {
        let window = self.window();
        if aggregate.visible {
            unsafe {
                self.taskbar.SetProgressState(window, TBPF_NORMAL)?;
                self.taskbar.SetProgressValue(
                    window,
                    (aggregate.fraction * 100.0).round() as u64,
                    100,
                )?;
            }
        } else {
            unsafe { self.taskbar.SetProgressState(window, TBPF_NOPROGRESS)? };
        }
        Ok(())
    }
}
