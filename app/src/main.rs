#![no_std]
#![no_main]

mod button;
mod led;

use core::panic::PanicInfo;
use cortex_m_rt::entry;

use button::*;
use kernel::task::entry_pid;
use led::*;

/// Semaphore indices into `kernel::config::SEMAPHORE_NAMES`.
const SEM_FLASH_REQ: u8 = 3;

const STACK_BYTES: u32 = 1024;

#[entry]
fn main() -> ! {
    init_led();
    init_user_button();

    kernel::state::create_semaphore(SEM_FLASH_REQ as usize, 0).expect("flashReq semaphore");

    kernel::state::create_thread(entry_pid(idle_task), "idle", kernel::config::LOWEST_PRIORITY, STACK_BYTES)
        .expect("idle task");
    kernel::state::create_thread(entry_pid(watcher_task), "watcher", 3, STACK_BYTES)
        .expect("watcher task");
    kernel::state::create_thread(entry_pid(flasher_task), "flasher", 2, STACK_BYTES)
        .expect("flasher task");

    unsafe { kernel::state::run() }
}

/// Lowest-priority background task; always runnable so the scheduler never
/// finds the task table empty.
extern "C" fn idle_task() -> ! {
    loop {
        kernel::syscall::stub::yield_now();
    }
}

/// Polls the user button and posts `flashReq` on a falling edge.
extern "C" fn watcher_task() -> ! {
    loop {
        if gpio_button_pressed() {
            kernel::syscall::stub::post(SEM_FLASH_REQ);
        }
        kernel::syscall::stub::sleep(10);
    }
}

/// Blocks on `flashReq` and toggles the on-board LED each time it's posted.
extern "C" fn flasher_task() -> ! {
    loop {
        kernel::syscall::stub::wait(SEM_FLASH_REQ);
        led1_toggle();
    }
}

#[panic_handler]
fn panic_handler(_info: &PanicInfo) -> ! {
    loop {}
}
