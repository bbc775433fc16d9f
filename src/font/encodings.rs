//! Shared encoding tables.
//!
//! The 256-entry tables map single-byte character codes to Unicode scalar
//! values (0 marks an unassigned slot). `glyph_name_to_codepoint` backs
//! `Differences` arrays; `cid_to_unicode_name` names the paired
//! `<collection>-UCS2` CMap for each predefined CJK encoding.


/// Adobe StandardEncoding.
pub static STANDARD_ENCODING: [u32; 256] = [
    0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000,
    0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000,
    0x0020, 0x0021, 0x0022, 0x0023, 0x0024, 0x0025, 0x0026, 0x2019, 0x0028, 0x0029, 0x002A, 0x002B, 0x002C, 0x002D, 0x002E, 0x002F,
    0x0030, 0x0031, 0x0032, 0x0033, 0x0034, 0x0035, 0x0036, 0x0037, 0x0038, 0x0039, 0x003A, 0x003B, 0x003C, 0x003D, 0x003E, 0x003F,
    0x0040, 0x0041, 0x0042, 0x0043, 0x0044, 0x0045, 0x0046, 0x0047, 0x0048, 0x0049, 0x004A, 0x004B, 0x004C, 0x004D, 0x004E, 0x004F,
    0x0050, 0x0051, 0x0052, 0x0053, 0x0054, 0x0055, 0x0056, 0x0057, 0x0058, 0x0059, 0x005A, 0x005B, 0x005C, 0x005D, 0x005E, 0x005F,
    0x2018, 0x0061, 0x0062, 0x0063, 0x0064, 0x0065, 0x0066, 0x0067, 0x0068, 0x0069, 0x006A, 0x006B, 0x006C, 0x006D, 0x006E, 0x006F,
    0x0070, 0x0071, 0x0072, 0x0073, 0x0074, 0x0075, 0x0076, 0x0077, 0x0078, 0x0079, 0x007A, 0x007B, 0x007C, 0x007D, 0x007E, 0x0000,
    0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000,
    0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000,
    0x0000, 0x00A1, 0x00A2, 0x00A3, 0x2044, 0x00A5, 0x0192, 0x00A7, 0x00A4, 0x0027, 0x201C, 0x00AB, 0x2039, 0x203A, 0xFB01, 0xFB02,
    0x0000, 0x2013, 0x2020, 0x2021, 0x00B7, 0x0000, 0x00B6, 0x2022, 0x201A, 0x201E, 0x201D, 0x00BB, 0x2026, 0x2030, 0x0000, 0x00BF,
    0x0000, 0x0060, 0x00B4, 0x02C6, 0x02DC, 0x00AF, 0x02D8, 0x02D9, 0x00A8, 0x0000, 0x02DA, 0x00B8, 0x0000, 0x02DD, 0x02DB, 0x02C7,
    0x2014, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000,
    0x0000, 0x00C6, 0x0000, 0x00AA, 0x0000, 0x0000, 0x0000, 0x0000, 0x0141, 0x00D8, 0x0152, 0x00BA, 0x0000, 0x0000, 0x0000, 0x0000,
    0x0000, 0x00E6, 0x0000, 0x0000, 0x0000, 0x0131, 0x0000, 0x0000, 0x0142, 0x00F8, 0x0153, 0x00DF, 0x0000, 0x0000, 0x0000, 0x0000,
];

/// WinAnsiEncoding (Windows code page 1252).
pub static WIN_ANSI_ENCODING: [u32; 256] = [
    0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000,
    0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000,
    0x0020, 0x0021, 0x0022, 0x0023, 0x0024, 0x0025, 0x0026, 0x0027, 0x0028, 0x0029, 0x002A, 0x002B, 0x002C, 0x002D, 0x002E, 0x002F,
    0x0030, 0x0031, 0x0032, 0x0033, 0x0034, 0x0035, 0x0036, 0x0037, 0x0038, 0x0039, 0x003A, 0x003B, 0x003C, 0x003D, 0x003E, 0x003F,
    0x0040, 0x0041, 0x0042, 0x0043, 0x0044, 0x0045, 0x0046, 0x0047, 0x0048, 0x0049, 0x004A, 0x004B, 0x004C, 0x004D, 0x004E, 0x004F,
    0x0050, 0x0051, 0x0052, 0x0053, 0x0054, 0x0055, 0x0056, 0x0057, 0x0058, 0x0059, 0x005A, 0x005B, 0x005C, 0x005D, 0x005E, 0x005F,
    0x0060, 0x0061, 0x0062, 0x0063, 0x0064, 0x0065, 0x0066, 0x0067, 0x0068, 0x0069, 0x006A, 0x006B, 0x006C, 0x006D, 0x006E, 0x006F,
    0x0070, 0x0071, 0x0072, 0x0073, 0x0074, 0x0075, 0x0076, 0x0077, 0x0078, 0x0079, 0x007A, 0x007B, 0x007C, 0x007D, 0x007E, 0x0000,
    0x20AC, 0x0000, 0x201A, 0x0192, 0x201E, 0x2026, 0x2020, 0x2021, 0x02C6, 0x2030, 0x0160, 0x2039, 0x0152, 0x0000, 0x017D, 0x0000,
    0x0000, 0x2018, 0x2019, 0x201C, 0x201D, 0x2022, 0x2013, 0x2014, 0x02DC, 0x2122, 0x0161, 0x203A, 0x0153, 0x0000, 0x017E, 0x0178,
    0x00A0, 0x00A1, 0x00A2, 0x00A3, 0x00A4, 0x00A5, 0x00A6, 0x00A7, 0x00A8, 0x00A9, 0x00AA, 0x00AB, 0x00AC, 0x00AD, 0x00AE, 0x00AF,
    0x00B0, 0x00B1, 0x00B2, 0x00B3, 0x00B4, 0x00B5, 0x00B6, 0x00B7, 0x00B8, 0x00B9, 0x00BA, 0x00BB, 0x00BC, 0x00BD, 0x00BE, 0x00BF,
    0x00C0, 0x00C1, 0x00C2, 0x00C3, 0x00C4, 0x00C5, 0x00C6, 0x00C7, 0x00C8, 0x00C9, 0x00CA, 0x00CB, 0x00CC, 0x00CD, 0x00CE, 0x00CF,
    0x00D0, 0x00D1, 0x00D2, 0x00D3, 0x00D4, 0x00D5, 0x00D6, 0x00D7, 0x00D8, 0x00D9, 0x00DA, 0x00DB, 0x00DC, 0x00DD, 0x00DE, 0x00DF,
    0x00E0, 0x00E1, 0x00E2, 0x00E3, 0x00E4, 0x00E5, 0x00E6, 0x00E7, 0x00E8, 0x00E9, 0x00EA, 0x00EB, 0x00EC, 0x00ED, 0x00EE, 0x00EF,
    0x00F0, 0x00F1, 0x00F2, 0x00F3, 0x00F4, 0x00F5, 0x00F6, 0x00F7, 0x00F8, 0x00F9, 0x00FA, 0x00FB, 0x00FC, 0x00FD, 0x00FE, 0x00FF,
];

/// MacRomanEncoding.
pub static MAC_ROMAN_ENCODING: [u32; 256] = [
    0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000,
    0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000,
    0x0020, 0x0021, 0x0022, 0x0023, 0x0024, 0x0025, 0x0026, 0x0027, 0x0028, 0x0029, 0x002A, 0x002B, 0x002C, 0x002D, 0x002E, 0x002F,
    0x0030, 0x0031, 0x0032, 0x0033, 0x0034, 0x0035, 0x0036, 0x0037, 0x0038, 0x0039, 0x003A, 0x003B, 0x003C, 0x003D, 0x003E, 0x003F,
    0x0040, 0x0041, 0x0042, 0x0043, 0x0044, 0x0045, 0x0046, 0x0047, 0x0048, 0x0049, 0x004A, 0x004B, 0x004C, 0x004D, 0x004E, 0x004F,
    0x0050, 0x0051, 0x0052, 0x0053, 0x0054, 0x0055, 0x0056, 0x0057, 0x0058, 0x0059, 0x005A, 0x005B, 0x005C, 0x005D, 0x005E, 0x005F,
    0x0060, 0x0061, 0x0062, 0x0063, 0x0064, 0x0065, 0x0066, 0x0067, 0x0068, 0x0069, 0x006A, 0x006B, 0x006C, 0x006D, 0x006E, 0x006F,
    0x0070, 0x0071, 0x0072, 0x0073, 0x0074, 0x0075, 0x0076, 0x0077, 0x0078, 0x0079, 0x007A, 0x007B, 0x007C, 0x007D, 0x007E, 0x0000,
    0x00C4, 0x00C5, 0x00C7, 0x00C9, 0x00D1, 0x00D6, 0x00DC, 0x00E1, 0x00E0, 0x00E2, 0x00E4, 0x00E3, 0x00E5, 0x00E7, 0x00E9, 0x00E8,
    0x00EA, 0x00EB, 0x00ED, 0x00EC, 0x00EE, 0x00EF, 0x00F1, 0x00F3, 0x00F2, 0x00F4, 0x00F6, 0x00F5, 0x00FA, 0x00F9, 0x00FB, 0x00FC,
    0x2020, 0x00B0, 0x00A2, 0x00A3, 0x00A7, 0x2022, 0x00B6, 0x00DF, 0x00AE, 0x00A9, 0x2122, 0x00B4, 0x00A8, 0x2260, 0x00C6, 0x00D8,
    0x221E, 0x00B1, 0x2264, 0x2265, 0x00A5, 0x00B5, 0x2202, 0x2211, 0x220F, 0x03C0, 0x222B, 0x00AA, 0x00BA, 0x03A9, 0x00E6, 0x00F8,
    0x00BF, 0x00A1, 0x00AC, 0x221A, 0x0192, 0x2248, 0x2206, 0x00AB, 0x00BB, 0x2026, 0x00A0, 0x00C0, 0x00C3, 0x00D5, 0x0152, 0x0153,
    0x2013, 0x2014, 0x201C, 0x201D, 0x2018, 0x2019, 0x00F7, 0x25CA, 0x00FF, 0x0178, 0x2044, 0x20AC, 0x2039, 0x203A, 0xFB01, 0xFB02,
    0x2021, 0x00B7, 0x201A, 0x201E, 0x2030, 0x00C2, 0x00CA, 0x00C1, 0x00CB, 0x00C8, 0x00CD, 0x00CE, 0x00CF, 0x00CC, 0x00D3, 0x00D4,
    0xF8FF, 0x00D2, 0x00DA, 0x00DB, 0x00D9, 0x0131, 0x02C6, 0x02DC, 0x00AF, 0x02D8, 0x02D9, 0x02DA, 0x00B8, 0x02DD, 0x02DB, 0x02C7,
];

/// Resolves a predefined simple-encoding name to its shared table.
pub fn predefined_simple_encoding(name: &[u8]) -> Option<&'static [u32; 256]> {
    match name {
        b"StandardEncoding" => Some(&STANDARD_ENCODING),
        b"WinAnsiEncoding" => Some(&WIN_ANSI_ENCODING),
        b"MacRomanEncoding" => Some(&MAC_ROMAN_ENCODING),
        _ => None,
    }
}

/// Standard character-name to codepoint table used by `Differences`.
pub fn glyph_name_to_codepoint(name: &[u8]) -> Option<u32> {
    let cp = match name {
        b"A" => 0x0041,
        b"AE" => 0x00C6,
        b"Aacute" => 0x00C1,
        b"Acircumflex" => 0x00C2,
        b"Adieresis" => 0x00C4,
        b"Agrave" => 0x00C0,
        b"Aring" => 0x00C5,
        b"Atilde" => 0x00C3,
        b"B" => 0x0042,
        b"C" => 0x0043,
        b"Ccedilla" => 0x00C7,
        b"D" => 0x0044,
        b"E" => 0x0045,
        b"Eacute" => 0x00C9,
        b"Ecircumflex" => 0x00CA,
        b"Edieresis" => 0x00CB,
        b"Egrave" => 0x00C8,
        b"Eth" => 0x00D0,
        b"Euro" => 0x20AC,
        b"F" => 0x0046,
        b"G" => 0x0047,
        b"H" => 0x0048,
        b"I" => 0x0049,
        b"Iacute" => 0x00CD,
        b"Icircumflex" => 0x00CE,
        b"Idieresis" => 0x00CF,
        b"Igrave" => 0x00CC,
        b"J" => 0x004A,
        b"K" => 0x004B,
        b"L" => 0x004C,
        b"Lslash" => 0x0141,
        b"M" => 0x004D,
        b"N" => 0x004E,
        b"Ntilde" => 0x00D1,
        b"O" => 0x004F,
        b"OE" => 0x0152,
        b"Oacute" => 0x00D3,
        b"Ocircumflex" => 0x00D4,
        b"Odieresis" => 0x00D6,
        b"Ograve" => 0x00D2,
        b"Oslash" => 0x00D8,
        b"Otilde" => 0x00D5,
        b"P" => 0x0050,
        b"Q" => 0x0051,
        b"R" => 0x0052,
        b"S" => 0x0053,
        b"Scaron" => 0x0160,
        b"T" => 0x0054,
        b"Thorn" => 0x00DE,
        b"U" => 0x0055,
        b"Uacute" => 0x00DA,
        b"Ucircumflex" => 0x00DB,
        b"Udieresis" => 0x00DC,
        b"Ugrave" => 0x00D9,
        b"V" => 0x0056,
        b"W" => 0x0057,
        b"X" => 0x0058,
        b"Y" => 0x0059,
        b"Yacute" => 0x00DD,
        b"Ydieresis" => 0x0178,
        b"Z" => 0x005A,
        b"Zcaron" => 0x017D,
        b"a" => 0x0061,
        b"aacute" => 0x00E1,
        b"acircumflex" => 0x00E2,
        b"acute" => 0x00B4,
        b"adieresis" => 0x00E4,
        b"ae" => 0x00E6,
        b"agrave" => 0x00E0,
        b"ampersand" => 0x0026,
        b"aring" => 0x00E5,
        b"asciicircum" => 0x005E,
        b"asciitilde" => 0x007E,
        b"asterisk" => 0x002A,
        b"at" => 0x0040,
        b"atilde" => 0x00E3,
        b"b" => 0x0062,
        b"backslash" => 0x005C,
        b"bar" => 0x007C,
        b"braceleft" => 0x007B,
        b"braceright" => 0x007D,
        b"bracketleft" => 0x005B,
        b"bracketright" => 0x005D,
        b"breve" => 0x02D8,
        b"brokenbar" => 0x00A6,
        b"bullet" => 0x2022,
        b"c" => 0x0063,
        b"caron" => 0x02C7,
        b"ccedilla" => 0x00E7,
        b"cedilla" => 0x00B8,
        b"cent" => 0x00A2,
        b"circumflex" => 0x02C6,
        b"colon" => 0x003A,
        b"comma" => 0x002C,
        b"copyright" => 0x00A9,
        b"currency" => 0x00A4,
        b"d" => 0x0064,
        b"dagger" => 0x2020,
        b"daggerdbl" => 0x2021,
        b"degree" => 0x00B0,
        b"dieresis" => 0x00A8,
        b"divide" => 0x00F7,
        b"dollar" => 0x0024,
        b"dotaccent" => 0x02D9,
        b"dotlessi" => 0x0131,
        b"e" => 0x0065,
        b"eacute" => 0x00E9,
        b"ecircumflex" => 0x00EA,
        b"edieresis" => 0x00EB,
        b"egrave" => 0x00E8,
        b"eight" => 0x0038,
        b"ellipsis" => 0x2026,
        b"emdash" => 0x2014,
        b"endash" => 0x2013,
        b"equal" => 0x003D,
        b"eth" => 0x00F0,
        b"exclam" => 0x0021,
        b"exclamdown" => 0x00A1,
        b"f" => 0x0066,
        b"fi" => 0xFB01,
        b"five" => 0x0035,
        b"fl" => 0xFB02,
        b"florin" => 0x0192,
        b"four" => 0x0034,
        b"fraction" => 0x2044,
        b"g" => 0x0067,
        b"germandbls" => 0x00DF,
        b"grave" => 0x0060,
        b"greater" => 0x003E,
        b"guillemotleft" => 0x00AB,
        b"guillemotright" => 0x00BB,
        b"guilsinglleft" => 0x2039,
        b"guilsinglright" => 0x203A,
        b"h" => 0x0068,
        b"hungarumlaut" => 0x02DD,
        b"hyphen" => 0x002D,
        b"i" => 0x0069,
        b"iacute" => 0x00ED,
        b"icircumflex" => 0x00EE,
        b"idieresis" => 0x00EF,
        b"igrave" => 0x00EC,
        b"j" => 0x006A,
        b"k" => 0x006B,
        b"l" => 0x006C,
        b"less" => 0x003C,
        b"logicalnot" => 0x00AC,
        b"lslash" => 0x0142,
        b"m" => 0x006D,
        b"macron" => 0x00AF,
        b"minus" => 0x2212,
        b"mu" => 0x00B5,
        b"multiply" => 0x00D7,
        b"n" => 0x006E,
        b"nine" => 0x0039,
        b"ntilde" => 0x00F1,
        b"numbersign" => 0x0023,
        b"o" => 0x006F,
        b"oacute" => 0x00F3,
        b"ocircumflex" => 0x00F4,
        b"odieresis" => 0x00F6,
        b"oe" => 0x0153,
        b"ogonek" => 0x02DB,
        b"ograve" => 0x00F2,
        b"one" => 0x0031,
        b"onehalf" => 0x00BD,
        b"onequarter" => 0x00BC,
        b"onesuperior" => 0x00B9,
        b"ordfeminine" => 0x00AA,
        b"ordmasculine" => 0x00BA,
        b"oslash" => 0x00F8,
        b"otilde" => 0x00F5,
        b"p" => 0x0070,
        b"paragraph" => 0x00B6,
        b"parenleft" => 0x0028,
        b"parenright" => 0x0029,
        b"percent" => 0x0025,
        b"period" => 0x002E,
        b"periodcentered" => 0x00B7,
        b"perthousand" => 0x2030,
        b"plus" => 0x002B,
        b"plusminus" => 0x00B1,
        b"q" => 0x0071,
        b"question" => 0x003F,
        b"questiondown" => 0x00BF,
        b"quotedbl" => 0x0022,
        b"quotedblbase" => 0x201E,
        b"quotedblleft" => 0x201C,
        b"quotedblright" => 0x201D,
        b"quoteleft" => 0x2018,
        b"quoteright" => 0x2019,
        b"quotesinglbase" => 0x201A,
        b"quotesingle" => 0x0027,
        b"r" => 0x0072,
        b"registered" => 0x00AE,
        b"ring" => 0x02DA,
        b"s" => 0x0073,
        b"scaron" => 0x0161,
        b"section" => 0x00A7,
        b"semicolon" => 0x003B,
        b"seven" => 0x0037,
        b"six" => 0x0036,
        b"slash" => 0x002F,
        b"space" => 0x0020,
        b"sterling" => 0x00A3,
        b"t" => 0x0074,
        b"thorn" => 0x00FE,
        b"three" => 0x0033,
        b"threequarters" => 0x00BE,
        b"threesuperior" => 0x00B3,
        b"tilde" => 0x02DC,
        b"trademark" => 0x2122,
        b"two" => 0x0032,
        b"twosuperior" => 0x00B2,
        b"u" => 0x0075,
        b"uacute" => 0x00FA,
        b"ucircumflex" => 0x00FB,
        b"udieresis" => 0x00FC,
        b"ugrave" => 0x00F9,
        b"underscore" => 0x005F,
        b"v" => 0x0076,
        b"w" => 0x0077,
        b"x" => 0x0078,
        b"y" => 0x0079,
        b"yacute" => 0x00FD,
        b"ydieresis" => 0x00FF,
        b"yen" => 0x00A5,
        b"z" => 0x007A,
        b"zcaron" => 0x017E,
        b"zero" => 0x0030,
        _ => return None,
    };
    Some(cp)
}

/// Maps a predefined CJK encoding name to its CID-to-Unicode CMap name.
pub fn cid_to_unicode_name(encoding: &[u8]) -> Option<&'static str> {
    let collection = match encoding {
        b"GB-EUC-H" | b"GB-EUC-V" | b"GBpc-EUC-H" | b"GBpc-EUC-V" | b"GBK-EUC-H" | b"GBK-EUC-V" | b"GBKp-EUC-H" | b"GBKp-EUC-V" | b"GBK2K-H" | b"GBK2K-V" | b"UniGB-UCS2-H" | b"UniGB-UCS2-V" | b"UniGB-UTF16-H" | b"UniGB-UTF16-V" => "Adobe-GB1",
        b"B5pc-H" | b"B5pc-V" | b"HKscs-B5-H" | b"HKscs-B5-V" | b"ETen-B5-H" | b"ETen-B5-V" | b"ETenms-B5-H" | b"ETenms-B5-V" | b"CNS-EUC-H" | b"CNS-EUC-V" | b"UniCNS-UCS2-H" | b"UniCNS-UCS2-V" | b"UniCNS-UTF16-H" | b"UniCNS-UTF16-V" => "Adobe-CNS1",
        b"83pv-RKSJ-H" | b"90ms-RKSJ-H" | b"90ms-RKSJ-V" | b"90msp-RKSJ-H" | b"90msp-RKSJ-V" | b"90pv-RKSJ-H" | b"Add-RKSJ-H" | b"Add-RKSJ-V" | b"EUC-H" | b"EUC-V" | b"Ext-RKSJ-H" | b"Ext-RKSJ-V" | b"H" | b"V" | b"UniJIS-UCS2-H" | b"UniJIS-UCS2-V" | b"UniJIS-UCS2-HW-H" | b"UniJIS-UCS2-HW-V" | b"UniJIS-UTF16-H" | b"UniJIS-UTF16-V" => "Adobe-Japan1",
        b"KSC-EUC-H" | b"KSC-EUC-V" | b"KSCms-UHC-H" | b"KSCms-UHC-V" | b"KSCms-UHC-HW-H" | b"KSCms-UHC-HW-V" | b"KSCpc-EUC-H" | b"UniKS-UCS2-H" | b"UniKS-UCS2-V" | b"UniKS-UTF16-H" | b"UniKS-UTF16-V" => "Adobe-Korea1",
        _ => return None,
    };
    Some(match collection {
        "Adobe-GB1" => "Adobe-GB1-UCS2",
        "Adobe-CNS1" => "Adobe-CNS1-UCS2",
        "Adobe-Japan1" => "Adobe-Japan1-UCS2",
        _ => "Adobe-Korea1-UCS2",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_range_is_identity_in_winansi() {
        for b in 0x20u32..0x7F {
            assert_eq!(WIN_ANSI_ENCODING[b as usize], b);
        }
    }

    #[test]
    fn standard_encoding_quote_slots() {
        assert_eq!(STANDARD_ENCODING[0x27], 0x2019);
        assert_eq!(STANDARD_ENCODING[0x60], 0x2018);
        assert_eq!(STANDARD_ENCODING[0x41], 'A' as u32);
    }

    #[test]
    fn winansi_high_slots() {
        assert_eq!(WIN_ANSI_ENCODING[0x80], 0x20AC);
        assert_eq!(WIN_ANSI_ENCODING[0xE9], 0x00E9);
    }

    #[test]
    fn glyph_names_resolve() {
        assert_eq!(glyph_name_to_codepoint(b"space"), Some(0x20));
        assert_eq!(glyph_name_to_codepoint(b"A"), Some(0x41));
        assert_eq!(glyph_name_to_codepoint(b"eacute"), Some(0xE9));
        assert_eq!(glyph_name_to_codepoint(b"nosuchglyph"), None);
    }

    #[test]
    fn cjk_encodings_resolve_to_collections() {
        assert_eq!(cid_to_unicode_name(b"GBK-EUC-H"), Some("Adobe-GB1-UCS2"));
        assert_eq!(cid_to_unicode_name(b"90ms-RKSJ-H"), Some("Adobe-Japan1-UCS2"));
        assert_eq!(cid_to_unicode_name(b"UniKS-UCS2-H"), Some("Adobe-Korea1-UCS2"));
        assert_eq!(cid_to_unicode_name(b"WinAnsiEncoding"), None);
    }
}
