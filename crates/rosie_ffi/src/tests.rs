use super::*;
use std::ffi::CString;

struct Session(*mut Engine);

impl Session {
    fn new() -> Self {
        let mut messages = RosieString::null(0);
        let e = unsafe { rosie_new(&mut messages) };
        assert!(!e.is_null());
        assert!(messages.is_null());
        // keep tests away from whatever ROSIE_LIBPATH points at
        let mut empty = unsafe { rosie_new_string(ptr::null(), 0) };
        assert!(!empty.is_null());
        assert_eq!(unsafe { rosie_libpath(e, &mut empty) }, SUCCESS);
        unsafe { rosie_free_string(empty) };
        Session(e)
    }

    fn compile(&self, expression: &str) -> (c_int, RosieString) {
        let expr = owned(expression.as_bytes());
        let mut pat = -1;
        let mut messages = RosieString::null(0);
        let rc = unsafe { rosie_compile(self.0, &expr, &mut pat, &mut messages) };
        assert_eq!(rc, SUCCESS);
        unsafe { rosie_free_string(expr) };
        (pat, messages)
    }

    fn match_with(&self, pat: c_int, start: c_int, encoder: &str, input: &[u8]) -> RosieMatchResult {
        let encoder = CString::new(encoder).unwrap();
        let input = owned(input);
        let mut result = RosieMatchResult::empty(ERR_NO_MATCH);
        let rc = unsafe { rosie_match(self.0, pat, start, encoder.as_ptr(), &input, &mut result) };
        assert_eq!(rc, SUCCESS);
        unsafe { rosie_free_string(input) };
        result
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        unsafe { rosie_finalize(self.0) };
    }
}

fn owned(bytes: &[u8]) -> RosieString {
    unsafe { rosie_new_string(bytes.as_ptr(), bytes.len()) }
}

/// Copy out and release a string written by the library.
fn take(s: RosieString) -> Vec<u8> {
    let bytes = unsafe { s.as_bytes() }.to_vec();
    unsafe { rosie_free_string(s) };
    bytes
}

#[test]
fn test_new_string_copies_bytes() {
    let s = owned(b"a\0b");
    assert_eq!(s.len, 3);
    assert_eq!(take(s), b"a\0b");

    let p = unsafe { rosie_new_string_ptr(b"xyz".as_ptr(), 3) };
    assert_eq!(unsafe { (*p).as_bytes() }, b"xyz");
    unsafe { rosie_free_string_ptr(p) };
    unsafe { rosie_free_string_ptr(ptr::null_mut()) };
}

#[test]
fn test_config_is_json() {
    let session = Session::new();
    let mut out = RosieString::null(0);
    assert_eq!(unsafe { rosie_config(session.0, &mut out) }, SUCCESS);
    let json: serde_json::Value = serde_json::from_slice(&take(out)).unwrap();
    assert_eq!(json.as_array().map(Vec::len), Some(2));
}

#[test]
fn test_compile_and_match() {
    let session = Session::new();
    let (pat, messages) = session.compile("[:digit:]+");
    assert!(pat > 0);
    assert!(messages.is_null());

    let result = session.match_with(pat, 1, "json", b"21x");
    assert_eq!(result.leftover, 1);
    assert_eq!(result.abend, 0);
    let json: serde_json::Value = serde_json::from_slice(&take(result.data)).unwrap();
    assert_eq!(json["data"], "21");
}

#[test]
fn test_compile_failure_reports_diagnostics() {
    let session = Session::new();
    let (pat, messages) = session.compile("[:nosuchclass:]");
    assert_eq!(pat, 0);
    let json: serde_json::Value = serde_json::from_slice(&take(messages)).unwrap();
    assert!(!json.as_array().unwrap().is_empty());
}

#[test]
fn test_match_sentinels() {
    let session = Session::new();
    let (pat, _) = session.compile("[:digit:]+");

    let result = session.match_with(pat, 1, "json", b"abc");
    assert!(result.data.is_null());
    assert_eq!(result.data.len, ERR_NO_MATCH);
    assert_eq!(result.leftover, 3);

    let result = session.match_with(pat, 1, "bool", b"1");
    assert!(result.data.is_null());
    assert_eq!(result.data.len, MATCH_WITHOUT_DATA);

    let result = session.match_with(pat, 1, "nosuch", b"1");
    assert_eq!(result.data.len, ERR_NO_ENCODER);

    let result = session.match_with(pat + 100, 1, "json", b"1");
    assert_eq!(result.data.len, ERR_NO_PATTERN);
    let result = session.match_with(0, 1, "json", b"1");
    assert_eq!(result.data.len, ERR_NO_PATTERN);
}

#[test]
fn test_free_rplx() {
    let session = Session::new();
    let (pat, _) = session.compile("\"a\"");
    assert_eq!(unsafe { rosie_free_rplx(session.0, pat) }, SUCCESS);
    assert_eq!(unsafe { rosie_free_rplx(session.0, pat) }, ERR_ENGINE_CALL_FAILED);
    let result = session.match_with(pat, 1, "json", b"a");
    assert_eq!(result.data.len, ERR_NO_PATTERN);
}

#[test]
fn test_alloc_limit() {
    let session = Session::new();
    let mut limit = 8192;
    let mut usage = 0;
    assert_eq!(unsafe { rosie_alloc_limit(session.0, &mut limit, &mut usage) }, SUCCESS);
    assert!(usage > 0);

    let mut query = -1;
    assert_eq!(unsafe { rosie_alloc_limit(session.0, &mut query, ptr::null_mut()) }, SUCCESS);
    assert_eq!(query, 8192);

    let mut too_small = 8191;
    assert_eq!(
        unsafe { rosie_alloc_limit(session.0, &mut too_small, ptr::null_mut()) },
        ERR_ENGINE_CALL_FAILED
    );
}

#[test]
fn test_libpath_query() {
    let session = Session::new();
    let mut path = RosieString::null(0);
    assert_eq!(unsafe { rosie_libpath(session.0, &mut path) }, SUCCESS);
    assert!(take(path).is_empty());
}

#[test]
fn test_trace() {
    let session = Session::new();
    let (pat, _) = session.compile("[:digit:]+");
    let style = CString::new("condensed").unwrap();
    let input = owned(b"12");
    let mut matched = 0;
    let mut trace = RosieString::null(0);
    let rc = unsafe { rosie_trace(session.0, pat, 1, style.as_ptr(), &input, &mut matched, &mut trace) };
    assert_eq!(rc, SUCCESS);
    assert_eq!(matched, 1);
    assert!(!take(trace).is_empty());

    let style = CString::new("sideways").unwrap();
    let rc = unsafe { rosie_trace(session.0, pat, 1, style.as_ptr(), &input, &mut matched, &mut trace) };
    assert_eq!(rc, SUCCESS);
    assert_eq!(trace.len, ERR_NO_ENCODER);
    unsafe { rosie_free_string(input) };
}

#[test]
fn test_load_and_import() {
    let session = Session::new();
    let src = owned(b"package demo\nword = [:alpha:]+\n");
    let mut ok = 0;
    let mut pkgname = RosieString::null(0);
    let mut messages = RosieString::null(0);
    let rc = unsafe { rosie_load(session.0, &mut ok, &src, &mut pkgname, &mut messages) };
    assert_eq!(rc, SUCCESS);
    assert_eq!(ok, 1);
    assert_eq!(take(pkgname), b"demo");
    assert!(messages.is_null());
    unsafe { rosie_free_string(src) };

    let name = owned(b"net");
    let as_name = owned(b"n");
    let mut actual = RosieString::null(0);
    let rc = unsafe { rosie_import(session.0, &mut ok, &name, &as_name, &mut actual, &mut messages) };
    assert_eq!(rc, SUCCESS);
    assert_eq!(ok, 1);
    assert_eq!(take(actual), b"net");
    let (pat, _) = session.compile("n.ipv4");
    assert!(pat > 0);

    let missing = owned(b"nosuchpackage");
    let rc = unsafe { rosie_import(session.0, &mut ok, &missing, ptr::null(), &mut actual, &mut messages) };
    assert_eq!(rc, SUCCESS);
    assert_eq!(ok, 0);
    assert!(!take(messages).is_empty());
    for s in [name, as_name, missing] {
        unsafe { rosie_free_string(s) };
    }
}

#[test]
fn test_loadfile() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("defs.rpl");
    std::fs::write(&path, "digits = [:digit:]+\n").unwrap();

    let session = Session::new();
    let fname = owned(path.to_str().unwrap().as_bytes());
    let mut ok = 0;
    let mut pkgname = RosieString::null(0);
    let mut messages = RosieString::null(0);
    let rc = unsafe { rosie_loadfile(session.0, &mut ok, &fname, &mut pkgname, &mut messages) };
    assert_eq!(rc, SUCCESS);
    assert_eq!(ok, 1);
    assert!(pkgname.is_null());
    assert!(session.compile("digits").0 > 0);
    unsafe { rosie_free_string(fname) };
}

#[test]
fn test_matchfile() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.txt");
    let output = dir.path().join("out.txt");
    let errors = dir.path().join("err.txt");
    std::fs::write(&input, "12\nab\n34\n").unwrap();

    let session = Session::new();
    let (pat, _) = session.compile("[:digit:]+");
    let encoder = CString::new("line").unwrap();
    let cpath = |p: &std::path::Path| CString::new(p.to_str().unwrap()).unwrap();
    let (infile, outfile, errfile) = (cpath(&input), cpath(&output), cpath(&errors));
    let (mut cin, mut cout, mut cerr) = (0, 0, 0);
    let mut err = RosieString::null(0);
    let rc = unsafe {
        rosie_matchfile(
            session.0,
            pat,
            encoder.as_ptr(),
            0,
            infile.as_ptr(),
            outfile.as_ptr(),
            errfile.as_ptr(),
            &mut cin,
            &mut cout,
            &mut cerr,
            &mut err,
        )
    };
    assert_eq!(rc, SUCCESS);
    assert_eq!((cin, cout, cerr), (3, 2, 1));
    assert_eq!(std::fs::read_to_string(&output).unwrap(), "12\n34\n");

    let absent = cpath(&dir.path().join("absent.txt"));
    let rc = unsafe {
        rosie_matchfile(
            session.0,
            pat,
            encoder.as_ptr(),
            0,
            absent.as_ptr(),
            outfile.as_ptr(),
            errfile.as_ptr(),
            &mut cin,
            &mut cout,
            &mut cerr,
            &mut err,
        )
    };
    assert_eq!(rc, SUCCESS);
    assert_eq!((cin, cout), (-1, ERR_NO_FILE as c_int));
    assert!(!take(err).is_empty());
}

#[cfg(unix)]
#[test]
fn test_matchfile_non_utf8_output_path() {
    use std::os::unix::ffi::{OsStrExt, OsStringExt};

    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.txt");
    std::fs::write(&input, "12\nab\n").unwrap();
    let mut raw = dir.path().as_os_str().as_bytes().to_vec();
    raw.extend_from_slice(b"/out\xff.txt");
    let output = std::path::PathBuf::from(std::ffi::OsString::from_vec(raw.clone()));

    let session = Session::new();
    let (pat, _) = session.compile("[:digit:]+");
    let encoder = CString::new("line").unwrap();
    let infile = CString::new(input.as_os_str().as_bytes()).unwrap();
    let outfile = CString::new(raw).unwrap();
    let errfile = CString::new(dir.path().join("err.txt").as_os_str().as_bytes()).unwrap();
    let (mut cin, mut cout, mut cerr) = (0, 0, 0);
    let mut err = RosieString::null(0);
    let rc = unsafe {
        rosie_matchfile(
            session.0,
            pat,
            encoder.as_ptr(),
            0,
            infile.as_ptr(),
            outfile.as_ptr(),
            errfile.as_ptr(),
            &mut cin,
            &mut cout,
            &mut cerr,
            &mut err,
        )
    };
    assert_eq!(rc, SUCCESS);
    assert_eq!((cin, cout, cerr), (2, 1, 1));
    assert_eq!(std::fs::read_to_string(&output).unwrap(), "12\n");
}

#[cfg(unix)]
#[test]
fn test_loadfile_non_utf8_path() {
    use std::os::unix::ffi::{OsStrExt, OsStringExt};

    let dir = tempfile::tempdir().unwrap();
    let mut raw = dir.path().as_os_str().as_bytes().to_vec();
    raw.extend_from_slice(b"/defs\xff.rpl");
    let path = std::path::PathBuf::from(std::ffi::OsString::from_vec(raw.clone()));
    std::fs::write(&path, "digits = [:digit:]+\n").unwrap();

    let session = Session::new();
    let fname = owned(&raw);
    let mut ok = 0;
    let mut pkgname = RosieString::null(0);
    let mut messages = RosieString::null(0);
    let rc = unsafe { rosie_loadfile(session.0, &mut ok, &fname, &mut pkgname, &mut messages) };
    assert_eq!(rc, SUCCESS);
    assert_eq!(ok, 1);
    assert!(session.compile("digits").0 > 0);
    unsafe { rosie_free_string(fname) };
}

#[test]
fn test_borrowed_string() {
    let text = b"borrowed\0bytes";
    let s = unsafe { rosie_string_from(text.as_ptr(), text.len()) };
    assert_eq!(s.len, 14);
    assert_eq!(s.ptr as *const u8, text.as_ptr());
    assert_eq!(unsafe { s.as_bytes() }, text);

    let boxed = unsafe { rosie_string_ptr_from(text.as_ptr(), text.len()) };
    assert_eq!(unsafe { (*boxed).as_bytes() }, text);
    unsafe { rosie_free_string_descriptor(boxed) };

    assert!(unsafe { rosie_string_from(ptr::null(), 3) }.is_null());
}

#[test]
fn test_rcfile() {
    let dir = tempfile::tempdir().unwrap();
    let session = Session::new();
    let mut file_exists = -1;
    let mut options = RosieString::null(0);
    let mut messages = RosieString::null(0);

    let absent = owned(dir.path().join("nope").to_str().unwrap().as_bytes());
    let rc = unsafe { rosie_read_rcfile(session.0, &absent, &mut file_exists, &mut options, &mut messages) };
    assert_eq!(rc, SUCCESS);
    assert_eq!(file_exists, 0);

    let path = dir.path().join("rc");
    std::fs::write(&path, "import = \"num\"\n").unwrap();
    let fname = owned(path.to_str().unwrap().as_bytes());
    let rc = unsafe { rosie_read_rcfile(session.0, &fname, &mut file_exists, &mut options, &mut messages) };
    assert_eq!(rc, SUCCESS);
    assert_eq!(file_exists, 1);
    let json: serde_json::Value = serde_json::from_slice(&take(options)).unwrap();
    assert_eq!(json[0]["import"], "num");

    let mut no_errors = 0;
    let rc = unsafe { rosie_execute_rcfile(session.0, &fname, &mut file_exists, &mut no_errors, &mut messages) };
    assert_eq!(rc, SUCCESS);
    assert_eq!((file_exists, no_errors), (1, 1));
    assert!(session.compile("num.int").0 > 0);
    unsafe { rosie_free_string(absent) };
    unsafe { rosie_free_string(fname) };
}

#[test]
fn test_null_engine_fails() {
    let mut out = RosieString::null(0);
    assert_eq!(unsafe { rosie_config(ptr::null_mut(), &mut out) }, ERR_ENGINE_CALL_FAILED);
    unsafe { rosie_finalize(ptr::null_mut()) };
}
