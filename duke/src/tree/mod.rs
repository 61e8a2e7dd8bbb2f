pub mod class;
pub mod field;
pub mod method;
pub mod attribute;
pub mod version;
pub mod descriptor;

pub(crate) mod names {
	use java_string::JavaStr;

	/// Checks if a class name is valid according to JVMS 4.2.1 (also accepting array class names).
	pub(super) fn is_valid_class_name(x: &JavaStr) -> bool {
		if x.chars().next().is_some_and(|c| c == '[') {
			// TODO: max 255 [ are allowed
			// TODO: must be a field desc
			true
		} else {
			// a list of identifiers split by /
			// each identifier must be an unqualified name
			x.split('/').all(is_valid_unqualified_name)
			// TODO: explicitly note that "" is not valid (tests?!)
		}
	}

	/// Checks if a name is an unqualified name according to JVMS 4.2.2
	///
	/// This is used for field names, formal parameter names, local variable names.
	pub(super) fn is_valid_unqualified_name(x: &JavaStr) -> bool {
		// must contain at least one unicode codepoint
		!x.is_empty() &&
			// must not contain any of . ; [ /
			x.chars().all(|c| c != '.' && c != ';' && c != '[' && c != '/')
	}

	/// Checks if a method name is valid according to JVMS 4.2.2
	pub(super) fn is_valid_method_name(x: &JavaStr) -> bool {
		// either one of the special names or an unqualified name with special < > restriction
		x == "<init>" || x == "<clinit>" || (
			// must contain at least one unicode codepoint
			!x.is_empty() &&
				x.chars().all(|c| c != '.' && c != ';' && c != '[' && c != '/' && c != '<' && c != '>')
		)
	}

	// TODO: 4.2.3 module and package names

	#[cfg(test)]
	mod testing {
		use java_string::JavaStr;
		use crate::tree::names::*;

		fn j(s: &str) -> &JavaStr {
			JavaStr::from_str(s)
		}

		#[test]
		fn class_names() {
			assert!(is_valid_class_name(j("java/lang/Object")));
			assert!(is_valid_class_name(j("java/lang/Thread")));
			assert!(is_valid_class_name(j("[[[D")));
			assert!(is_valid_class_name(j("An$Inner$Class")));

			assert!(!is_valid_class_name(j(""))); // it may come as a surprise, but an empty class name is not valid
			assert!(!is_valid_class_name(j("/")));
			assert!(!is_valid_class_name(j("/a")));
			assert!(!is_valid_class_name(j("a/")));
			assert!(!is_valid_class_name(j("//a")));
			assert!(!is_valid_class_name(j("a//")));
			assert!(!is_valid_class_name(j("a.b")));
			assert!(!is_valid_class_name(j("a;b")));
			assert!(!is_valid_class_name(j("a[b")));
		}

		#[test]
		fn unqualified_names() {
			assert!(is_valid_unqualified_name(j("foo")));
			assert!(is_valid_unqualified_name(j("bar")));
			assert!(is_valid_unqualified_name(j("FOO")));
			assert!(is_valid_unqualified_name(j("1234567"))); // yes numbers are valid here, but not in java source code
			assert!(is_valid_unqualified_name(j("---")));
			assert!(is_valid_unqualified_name(j("a$name")));

			assert!(!is_valid_unqualified_name(j("")));
			assert!(!is_valid_unqualified_name(j(".")));
			assert!(!is_valid_unqualified_name(j(";")));
			assert!(!is_valid_unqualified_name(j("[")));
			assert!(!is_valid_unqualified_name(j("/")));
		}

		#[test]
		fn method_names() {
			assert!(is_valid_method_name(j("foo")));
			assert!(is_valid_method_name(j("bar")));
			assert!(is_valid_method_name(j("FOO")));
			assert!(is_valid_method_name(j("1234567"))); // yes numbers are valid here, but not in java source code
			assert!(is_valid_method_name(j("---")));
			assert!(is_valid_method_name(j("a$name")));

			assert!(!is_valid_method_name(j("")));
			assert!(!is_valid_method_name(j(".")));
			assert!(!is_valid_method_name(j(";")));
			assert!(!is_valid_method_name(j("[")));
			assert!(!is_valid_method_name(j("/")));
			assert!(!is_valid_method_name(j("<NotClinit>")));
			assert!(!is_valid_method_name(j("<>")));
			assert!(!is_valid_method_name(j("<")));
			assert!(!is_valid_method_name(j(">")));
		}
	}
}
