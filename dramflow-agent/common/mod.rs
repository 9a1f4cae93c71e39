pub mod sysfs;

#[cfg(test)]
pub(crate) mod testing;
