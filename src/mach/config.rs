/// Interpreter limits and display settings.
#[derive(Debug, Clone)]
pub struct Config {
    /// Capacity of the string heap in bytes.
    pub string_space: usize,
    /// Width of a PRINT comma zone.
    pub print_zone: usize,
    /// Initial console width.
    pub width: usize,
    /// Size of the PEEK/POKE memory.
    pub memory_size: usize,
    /// Highest legal file number.
    pub max_files: u16,
    /// Bound on each control stack.
    pub stack_depth: usize,
    /// RANDOM record length when OPEN gives none.
    pub record_len: usize,
    /// Bound on nested user function calls.
    pub function_depth: usize,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            string_space: 8192,
            print_zone: 14,
            width: 80,
            memory_size: 1 << 20,
            max_files: 255,
            stack_depth: 65535,
            record_len: 128,
            function_depth: 256,
        }
    }
}
