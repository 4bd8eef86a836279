// Events go to the `grouplist_fetch` target. Without the `tracing` feature every call expands to nothing.

#[cfg(feature = "tracing")]
macro_rules! flog {
    ($level:ident, $($arg:tt)+) => {
        tracing::$level!(target: "grouplist_fetch", $($arg)+)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! flog {
    ($level:ident, $($arg:tt)+) => {};
}

macro_rules! ftrace {
    ($($arg:tt)+) => {
        flog!(trace, $($arg)+)
    };
}

macro_rules! fdebug {
    ($($arg:tt)+) => {
        flog!(debug, $($arg)+)
    };
}

macro_rules! fwarn {
    ($($arg:tt)+) => {
        flog!(warn, $($arg)+)
    };
}
