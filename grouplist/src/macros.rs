// Events go to the `grouplist` target. Without the `tracing` feature every call expands to nothing.

#[cfg(feature = "tracing")]
macro_rules! glog {
    ($level:ident, $($arg:tt)+) => {
        tracing::$level!(target: "grouplist", $($arg)+)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! glog {
    ($level:ident, $($arg:tt)+) => {};
}

macro_rules! gtrace {
    ($($arg:tt)+) => {
        glog!(trace, $($arg)+)
    };
}

macro_rules! gdebug {
    ($($arg:tt)+) => {
        glog!(debug, $($arg)+)
    };
}

macro_rules! gwarn {
    ($($arg:tt)+) => {
        glog!(warn, $($arg)+)
    };
}
