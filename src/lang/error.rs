use super::{Column, LineNumber};

/// A BASIC error: the numeric code `ERR` reports, where it happened,
/// and an optional detail appended to the standard message.
#[derive(Clone, PartialEq)]
pub struct Error {
    code: u16,
    line_number: LineNumber,
    column: Column,
    message: String,
}

#[doc(hidden)]
#[macro_export]
macro_rules! error {
    ($err:ident) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err)
    };
    ($err:ident, ..$col:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err).in_column($col)
    };
    ($err:ident, $line:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err).in_line_number($line)
    };
    ($err:ident; $msg:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err).message($msg)
    };
    ($err:ident, ..$col:expr;  $msg:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err)
            .in_column($col)
            .message($msg)
    };
    ($err:ident, $line:expr, ..$col:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err)
            .in_line_number($line)
            .in_column($col)
    };
    ($err:ident, $line:expr; $msg:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err)
            .in_line_number($line)
            .message($msg)
    };
    ($err:ident, $line:expr, ..$col:expr;  $msg:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err)
            .in_line_number($line)
            .in_column($col)
            .message($msg)
    };
}

impl Error {
    pub fn new(code: ErrorCode) -> Error {
        Error::from_code(code as u16)
    }

    /// Errors raised by `ERROR n` may carry any code from 1 to 255.
    pub fn from_code(code: u16) -> Error {
        Error {
            code,
            line_number: None,
            column: 0..0,
            message: String::new(),
        }
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn line_number(&self) -> LineNumber {
        self.line_number
    }

    pub fn column(&self) -> Column {
        self.column.clone()
    }

    pub fn detail(&self) -> &str {
        &self.message
    }

    pub fn is_direct(&self) -> bool {
        self.line_number.is_none()
    }

    /// The first line number attached wins; the dispatcher decorates
    /// errors on their way out and must not overwrite an inner one.
    pub fn in_line_number(self, line: LineNumber) -> Error {
        if self.line_number.is_some() {
            return self;
        }
        Error {
            line_number: line,
            ..self
        }
    }

    pub fn in_column(self, column: &Column) -> Error {
        if self.column != (0..0) {
            return self;
        }
        Error {
            column: column.clone(),
            ..self
        }
    }

    pub fn message<S: Into<String>>(self, message: S) -> Error {
        Error {
            message: message.into(),
            ..self
        }
    }

    /// The standard GW-BASIC text for this code.
    pub fn description(&self) -> &'static str {
        describe(self.code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    NextWithoutFor = 1,
    SyntaxError = 2,
    ReturnWithoutGosub = 3,
    OutOfData = 4,
    IllegalFunctionCall = 5,
    Overflow = 6,
    OutOfMemory = 7,
    UndefinedLine = 8,
    SubscriptOutOfRange = 9,
    DuplicateDefinition = 10,
    DivisionByZero = 11,
    IllegalDirect = 12,
    TypeMismatch = 13,
    OutOfStringSpace = 14,
    StringTooLong = 15,
    StringFormulaTooComplex = 16,
    CantContinue = 17,
    UndefinedUserFunction = 18,
    NoResume = 19,
    ResumeWithoutError = 20,
    UnprintableError = 21,
    MissingOperand = 22,
    LineBufferOverflow = 23,
    ForWithoutNext = 26,
    WhileWithoutWend = 29,
    WendWithoutWhile = 30,
    FieldOverflow = 50,
    InternalError = 51,
    BadFileNumber = 52,
    FileNotFound = 53,
    BadFileMode = 54,
    FileAlreadyOpen = 55,
    DeviceIoError = 57,
    FileAlreadyExists = 58,
    DiskFull = 61,
    InputPastEnd = 62,
    BadRecordNumber = 63,
    BadFileName = 64,
    DirectStatementInFile = 66,
    TooManyFiles = 67,
    PermissionDenied = 70,
    AdvancedFeature = 73,
}

fn describe(code: u16) -> &'static str {
    match code {
        1 => "NEXT without FOR",
        2 => "Syntax error",
        3 => "RETURN without GOSUB",
        4 => "Out of DATA",
        5 => "Illegal function call",
        6 => "Overflow",
        7 => "Out of memory",
        8 => "Undefined line number",
        9 => "Subscript out of range",
        10 => "Duplicate Definition",
        11 => "Division by zero",
        12 => "Illegal direct",
        13 => "Type mismatch",
        14 => "Out of string space",
        15 => "String too long",
        16 => "String formula too complex",
        17 => "Can't continue",
        18 => "Undefined user function",
        19 => "No RESUME",
        20 => "RESUME without error",
        22 => "Missing operand",
        23 => "Line buffer overflow",
        24 => "Device Timeout",
        25 => "Device Fault",
        26 => "FOR without NEXT",
        27 => "Out of paper",
        29 => "WHILE without WEND",
        30 => "WEND without WHILE",
        50 => "FIELD overflow",
        51 => "Internal error",
        52 => "Bad file number",
        53 => "File not found",
        54 => "Bad file mode",
        55 => "File already open",
        57 => "Device I/O Error",
        58 => "File already exists",
        61 => "Disk full",
        62 => "Input past end",
        63 => "Bad record number",
        64 => "Bad file name",
        66 => "Direct statement in file",
        67 => "Too many files",
        70 => "Permission Denied",
        73 => "Advanced Feature",
        _ => "Unprintable error",
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        use std::io::ErrorKind;
        let code = match err.kind() {
            ErrorKind::NotFound => ErrorCode::FileNotFound,
            ErrorKind::PermissionDenied => ErrorCode::PermissionDenied,
            ErrorKind::AlreadyExists => ErrorCode::FileAlreadyExists,
            ErrorKind::UnexpectedEof => ErrorCode::InputPastEnd,
            _ if err.raw_os_error() == Some(28) => ErrorCode::DiskFull,
            _ => ErrorCode::DeviceIoError,
        };
        Error::new(code).message(err.to_string())
    }
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Error {{ {} ({}) }}", self.to_string(), self.code)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self.line_number {
            Some(line) => write!(f, "Error in line {}: {}", line, self.description())?,
            None => write!(f, "Error: {}", self.description())?,
        }
        if !self.message.is_empty() {
            write!(f, "; {}", self.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {}
