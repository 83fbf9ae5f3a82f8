//! Standard-library and builtin classification.
//!
//! Consulted during extraction before a referenced symbol lands in an index's
//! `dependencies` list. A name must not be reported as an external dependency
//! when its home package is the package under analysis, a recognized standard
//! library, or a builtin keyword/alias.
//!
//! All checks are case-sensitive where the language is.

use std::collections::HashSet;
use std::sync::OnceLock;

use crate::model::Language;

/// Go: a package path is standard-library iff its first path element
/// contains no dot (`io/fs` yes, `github.com/x/y` no).
pub fn is_go_stdlib_package(package: &str) -> bool {
    let first = package.split('/').next().unwrap_or(package);
    !first.is_empty() && !first.contains('.')
}

/// Go builtin primitive spellings.
pub fn is_go_builtin(name: &str) -> bool {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| {
        [
            "bool", "int", "int8", "int16", "int32", "int64", "uint", "uint8", "uint16", "uint32",
            "uint64", "uintptr", "float32", "float64", "complex64", "complex128", "string", "byte",
            "rune", "error", "any",
        ]
        .into_iter()
        .collect()
    })
    .contains(name)
}

/// Java: `java.`, `javax.`, `jdk.`, `sun.` prefixed packages are standard.
pub fn is_java_standard_package(package: &str) -> bool {
    ["java.", "javax.", "jdk.", "sun."]
        .iter()
        .any(|prefix| package.starts_with(prefix))
        || matches!(package, "java" | "javax" | "jdk" | "sun")
}

/// Java: primitives plus simple names resolvable to the core packages
/// (`java.lang`, `java.util`, `java.io`, `java.util.concurrent`, `java.time`).
pub fn is_java_builtin(name: &str) -> bool {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| {
        [
            // primitives
            "int", "long", "double", "boolean", "char", "byte", "float", "short", "void",
            // java.lang
            "Object", "String", "Integer", "Long", "Double", "Boolean", "Character", "Byte",
            "Float", "Short", "Void", "Number", "CharSequence", "StringBuilder", "Iterable",
            "Comparable", "Runnable", "Thread", "Throwable", "Exception", "RuntimeException",
            "Error", "IllegalArgumentException", "IllegalStateException",
            "UnsupportedOperationException", "NullPointerException", "Class", "Enum", "Record",
            "Math", "System", "AutoCloseable", "Override", "Deprecated", "FunctionalInterface",
            "SafeVarargs", "SuppressWarnings",
            // java.util
            "List", "ArrayList", "LinkedList", "Map", "HashMap", "LinkedHashMap", "TreeMap",
            "Set", "HashSet", "LinkedHashSet", "TreeSet", "Collection", "Collections", "Arrays",
            "Optional", "OptionalInt", "OptionalLong", "Iterator", "Queue", "Deque", "ArrayDeque",
            "UUID", "Objects", "Comparator", "Stream", "Spliterator",
            // java.io
            "InputStream", "OutputStream", "Reader", "Writer", "File", "IOException",
            "UncheckedIOException", "Closeable",
            // java.util.concurrent
            "CompletableFuture", "Future", "Executor", "ExecutorService", "TimeUnit",
            "ConcurrentHashMap", "CountDownLatch", "Callable",
            // java.time
            "Instant", "Duration", "LocalDate", "LocalTime", "LocalDateTime", "ZonedDateTime",
            "OffsetDateTime", "ZoneId", "Period", "Clock",
        ]
        .into_iter()
        .collect()
    })
    .contains(name)
}

/// Python: top-level module membership in the recognized stdlib set.
pub fn is_python_stdlib_module(module: &str) -> bool {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    let top = module.split('.').next().unwrap_or(module);
    SET.get_or_init(|| {
        [
            "abc", "argparse", "array", "asyncio", "base64", "binascii", "bisect", "builtins",
            "cmath", "collections", "concurrent", "contextlib", "contextvars", "copy", "csv",
            "ctypes", "dataclasses", "datetime", "decimal", "difflib", "email", "enum", "errno",
            "functools", "gc", "getpass", "glob", "gzip", "hashlib", "heapq", "hmac", "html",
            "http", "importlib", "inspect", "io", "ipaddress", "itertools", "json", "logging",
            "lzma", "math", "mimetypes", "multiprocessing", "numbers", "operator", "os",
            "pathlib", "pickle", "platform", "plistlib", "queue", "random", "re", "sched",
            "secrets", "select", "shlex", "shutil", "signal", "socket", "sqlite3", "ssl",
            "statistics", "string", "struct", "subprocess", "sys", "tempfile", "textwrap",
            "threading", "time", "timeit", "tkinter", "traceback", "types", "typing",
            "unicodedata", "unittest", "urllib", "uuid", "warnings", "weakref", "xml", "xmlrpc",
            "zipfile", "zlib",
        ]
        .into_iter()
        .collect()
    })
    .contains(top)
}

/// Python: type-annotation syntactic forms and builtin value types.
pub fn is_python_builtin(name: &str) -> bool {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| {
        [
            "Optional", "List", "Dict", "Tuple", "Any", "Union", "Set", "Callable", "Iterable",
            "Iterator", "Sequence", "Mapping", "Type", "None", "str", "int", "float", "bool",
            "bytes", "bytearray", "dict", "list", "set", "tuple", "frozenset", "object", "self",
            "cls", "True", "False",
        ]
        .into_iter()
        .collect()
    })
    .contains(name)
}

/// .NET: `System*` and `Microsoft.Extensions*` namespaces are built in.
pub fn is_dotnet_builtin_namespace(namespace: &str) -> bool {
    namespace == "System"
        || namespace.starts_with("System.")
        || namespace == "Microsoft.Extensions"
        || namespace.starts_with("Microsoft.Extensions.")
}

/// .NET: primitive aliases plus simple names resolvable to core `System`
/// namespaces.
pub fn is_dotnet_builtin(name: &str) -> bool {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| {
        [
            // primitive aliases
            "string", "int", "bool", "long", "double", "float", "decimal", "byte", "char",
            "object", "void", "uint", "ulong", "short", "ushort", "sbyte", "nint", "nuint",
            // System
            "String", "Object", "Boolean", "Int32", "Int64", "Double", "Single", "Decimal",
            "Byte", "Char", "Void", "Guid", "DateTime", "DateTimeOffset", "TimeSpan", "Uri",
            "Exception", "SystemException", "ArgumentException", "ArgumentNullException",
            "InvalidOperationException", "NotSupportedException", "IDisposable", "IAsyncDisposable",
            "EventArgs", "EventHandler", "Nullable", "Array", "Convert", "Func", "Action",
            "Predicate", "Lazy", "Tuple", "ValueTask", "Task", "CancellationToken", "IProgress",
            // System.Collections.Generic and friends
            "List", "IList", "IReadOnlyList", "Dictionary", "IDictionary", "IReadOnlyDictionary",
            "HashSet", "ISet", "IEnumerable", "IEnumerator", "ICollection", "IReadOnlyCollection",
            "IAsyncEnumerable", "KeyValuePair", "Queue", "Stack", "Memory", "ReadOnlyMemory",
            "Span", "ReadOnlySpan", "Stream", "TextReader", "TextWriter", "BinaryData",
            "StringBuilder", "Encoding", "Regex", "JsonElement", "JsonDocument",
        ]
        .into_iter()
        .collect()
    })
    .contains(name)
}

/// TypeScript: primitive keywords plus recognized `lib.d.ts` globals.
pub fn is_typescript_builtin(name: &str) -> bool {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| {
        [
            "string", "number", "boolean", "void", "undefined", "null", "any", "unknown",
            "never", "bigint", "symbol", "object", "this", "Promise", "Array", "ReadonlyArray",
            "Map", "Set", "WeakMap", "WeakSet", "Record", "Partial", "Required", "Readonly",
            "Pick", "Omit", "Exclude", "Extract", "Awaited", "ReturnType", "Parameters", "Date",
            "RegExp", "Uint8Array", "Int8Array", "Uint16Array", "Int32Array", "Float64Array",
            "ArrayBuffer", "SharedArrayBuffer", "DataView", "Error", "TypeError", "RangeError",
            "SyntaxError", "AbortSignal", "AbortController", "AsyncIterable", "AsyncIterator",
            "Iterator", "Iterable", "IterableIterator", "Generator", "AsyncGenerator", "Symbol",
            "Function", "Blob", "URL", "URLSearchParams", "Headers", "Request", "Response",
            "FormData", "JSON", "Math", "Infinity", "NaN", "globalThis", "Buffer",
        ]
        .into_iter()
        .collect()
    })
    .contains(name)
}

/// Per-language builtin check for a bare type name seen in a signature.
pub fn is_builtin(language: Language, name: &str) -> bool {
    match language {
        Language::DotNet => is_dotnet_builtin(name),
        Language::Python => is_python_builtin(name),
        Language::TypeScript => is_typescript_builtin(name),
        Language::Go => is_go_builtin(name),
        Language::Java => is_java_builtin(name),
    }
}

/// Per-language standard-library check for a package/module/namespace.
pub fn is_stdlib_package(language: Language, package: &str) -> bool {
    match language {
        Language::DotNet => is_dotnet_builtin_namespace(package),
        Language::Python => is_python_stdlib_module(package),
        // TypeScript has no stdlib package notion beyond its globals.
        Language::TypeScript => false,
        Language::Go => is_go_stdlib_package(package),
        Language::Java => is_java_standard_package(package),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn go_stdlib_is_dotless_first_element() {
        assert!(is_go_stdlib_package("context"));
        assert!(is_go_stdlib_package("io/fs"));
        assert!(is_go_stdlib_package("net/http"));
        assert!(!is_go_stdlib_package("github.com/stretchr/testify"));
        assert!(!is_go_stdlib_package("example.com/util"));
    }

    #[test]
    fn java_prefixes_and_simple_names() {
        assert!(is_java_standard_package("java.util.concurrent"));
        assert!(is_java_standard_package("javax.annotation"));
        assert!(!is_java_standard_package("com.azure.core"));
        assert!(is_java_builtin("CompletableFuture"));
        assert!(is_java_builtin("String"));
        assert!(is_java_builtin("void"));
        assert!(!is_java_builtin("ChatClient"));
    }

    #[test]
    fn python_top_level_module_decides() {
        assert!(is_python_stdlib_module("typing"));
        assert!(is_python_stdlib_module("collections.abc"));
        assert!(!is_python_stdlib_module("azure.core"));
        assert!(is_python_builtin("Optional"));
        assert!(!is_python_builtin("Pipeline"));
    }

    #[test]
    fn dotnet_namespaces_are_prefix_matched() {
        assert!(is_dotnet_builtin_namespace("System"));
        assert!(is_dotnet_builtin_namespace("System.Text.Json"));
        assert!(is_dotnet_builtin_namespace("Microsoft.Extensions.Logging"));
        assert!(!is_dotnet_builtin_namespace("Microsoft.Azure"));
        assert!(is_dotnet_builtin("string"));
        assert!(is_dotnet_builtin("CancellationToken"));
        assert!(!is_dotnet_builtin("ChatMessage"));
    }

    #[test]
    fn classification_is_case_sensitive() {
        assert!(is_typescript_builtin("string"));
        assert!(!is_typescript_builtin("string".to_uppercase().as_str()));
        assert!(is_go_builtin("error"));
        assert!(!is_go_builtin("Error"));
    }
}
