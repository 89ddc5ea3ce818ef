// SPDX-License-Identifier: Apache-2.0

use byteflow::ByteString;

#[test]
fn hex_and_base64_round_trip_known_vectors() {
	let bytes = ByteString::from(b"hello world".to_vec());
	assert_eq!(bytes.hex_lower(), "68656c6c6f20776f726c64");
	assert_eq!(bytes.hex_upper(), "68656C6C6F20776F726C64");
	assert_eq!(bytes.base64(), "aGVsbG8gd29ybGQ=");
}

#[test]
fn base64_url_avoids_padding_characters_that_need_escaping() {
	let bytes = ByteString::from(vec![0xFB, 0xFF, 0xBE]);
	let url = bytes.base64_url();
	assert!(!url.contains('+'));
	assert!(!url.contains('/'));
}

#[cfg(feature = "sha2")]
#[test]
fn sha256_matches_known_vector() {
	let bytes = ByteString::from(b"abc".to_vec());
	assert_eq!(bytes.hex_lower(), "616263");
	assert_eq!(
		ByteString::from(bytes.sha256()).hex_lower(),
		"ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad",
	);
}

#[cfg(feature = "sha3")]
#[test]
fn sha3_256_produces_32_bytes() {
	let bytes = ByteString::from(b"abc".to_vec());
	assert_eq!(bytes.sha3_256().len(), 32);
}

#[cfg(feature = "broken-hash")]
#[test]
fn md5_and_sha1_are_available_only_behind_broken_hash() {
	let bytes = ByteString::from(b"abc".to_vec());
	assert_eq!(bytes.md5().len(), 16);
	assert_eq!(bytes.sha1().len(), 20);
}
