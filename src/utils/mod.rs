pub mod time;

const ID_ALPHABET: [char; 36] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
];

/// Generate a long unique id for a crawl run.
pub fn longid() -> String {
    nanoid::nanoid!(21, &ID_ALPHABET)
}

/// Generate a short lowercase id, used to mint definition names for
/// undocumented response statuses.
pub fn shortid() -> String {
    nanoid::nanoid!(7, &ID_ALPHABET)
}
