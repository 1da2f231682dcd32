//! Win32 process enumeration

use std::io;

use tracing::trace;
use windows::Win32::Foundation::{CloseHandle, HMODULE};
use windows::Win32::System::ProcessStatus::{
    EnumProcessModules, EnumProcesses, GetModuleBaseNameW,
};
use windows::Win32::System::Threading::{
    OpenProcess, PROCESS_QUERY_INFORMATION, PROCESS_VM_READ,
};

const MAX_PROCESSES: usize = 1024;
const MAX_PATH: usize = 260;

/// Base module names of every process we are allowed to open.
pub(crate) fn process_names() -> io::Result<Vec<String>> {
    let mut pids = [0u32; MAX_PROCESSES];
    let mut needed = 0u32;

    // SAFETY: the buffer and its byte length describe the same array.
    unsafe {
        EnumProcesses(pids.as_mut_ptr(), size_of_val(&pids) as u32, &mut needed)
            .map_err(io::Error::other)?;
    }

    let count = (needed as usize / size_of::<u32>()).min(MAX_PROCESSES);
    let names = pids[..count].iter().filter(|&&pid| pid != 0).filter_map(|&pid| module_name(pid));
    Ok(names.collect())
}

fn module_name(pid: u32) -> Option<String> {
    // SAFETY: the handle is closed before returning and the module and name
    // buffers outlive the calls that fill them.
    unsafe {
        let process = match OpenProcess(PROCESS_QUERY_INFORMATION | PROCESS_VM_READ, false, pid) {
            Ok(handle) => handle,
            Err(e) => {
                // System and protected processes refuse access
                trace!("Cannot open process {}: {}", pid, e);
                return None;
            }
        };

        let mut module = HMODULE::default();
        let mut needed = 0u32;
        let mut buffer = [0u16; MAX_PATH];
        let name = if EnumProcessModules(
            process,
            &mut module,
            size_of::<HMODULE>() as u32,
            &mut needed,
        )
        .is_ok()
        {
            let len = GetModuleBaseNameW(process, Some(module), &mut buffer) as usize;
            (len > 0).then(|| String::from_utf16_lossy(&buffer[..len]))
        } else {
            None
        };

        let _ = CloseHandle(process);
        name
    }
}
