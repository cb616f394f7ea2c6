//-
// Copyright (c) 2020, Jason Lingle
//
// This file is part of Mimetree.
//
// Mimetree is free software: you can  redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free
// Software Foundation, either version 3 of the License, or (at your option)
// any later version.
//
// Mimetree is distributed in the hope that it will be useful, but WITHOUT ANY
// WARRANTY; without  even the implied  warranty of MERCHANTABILITY  or FITNESS
// FOR  A PARTICULAR  PURPOSE.  See the  GNU General  Public  License for  more
// details.
//
// You should have received a copy of the GNU General Public License along with
// Mimetree. If not, see <http://www.gnu.org/licenses/>.

//! Well-known names used throughout MIME documents.
//!
//! Media types, encodings and disposition types are given in the lower case
//! form used for comparison. Field names are given in their conventional
//! capitalisation; lookups are case-insensitive regardless.

pub mod media_types {
    pub const TEXT: &str = "text";
    pub const MULTIPART: &str = "multipart";
    pub const MESSAGE: &str = "message";
    pub const APPLICATION: &str = "application";
    pub const IMAGE: &str = "image";
    pub const AUDIO: &str = "audio";
    pub const VIDEO: &str = "video";

    pub const TEXT_PLAIN: &str = "plain";
    pub const TEXT_HTML: &str = "html";
    pub const TEXT_RICHTEXT: &str = "richtext";
    pub const TEXT_ENRICHED: &str = "enriched";

    pub const MULTIPART_MIXED: &str = "mixed";
    pub const MULTIPART_RELATED: &str = "related";
    pub const MULTIPART_ALTERNATIVE: &str = "alternative";
    pub const MULTIPART_PARALLEL: &str = "parallel";
    pub const MULTIPART_DIGEST: &str = "digest";

    pub const MESSAGE_RFC822: &str = "rfc822";
    pub const MESSAGE_PARTIAL: &str = "partial";
    pub const MESSAGE_EXTERNAL_BODY: &str = "external-body";

    pub const APPLICATION_OCTET_STREAM: &str = "octet-stream";

    pub const IMAGE_JPEG: &str = "jpeg";
    pub const IMAGE_GIF: &str = "gif";

    pub const AUDIO_BASIC: &str = "basic";

    pub const VIDEO_MPEG: &str = "mpeg";
}

pub mod encoding_types {
    pub const SEVEN_BIT: &str = "7bit";
    pub const EIGHT_BIT: &str = "8bit";
    pub const BASE64: &str = "base64";
    pub const QUOTED_PRINTABLE: &str = "quoted-printable";
    pub const BINARY: &str = "binary";
    pub const UUENCODE: &str = "uuencode";
}

pub mod disposition_types {
    pub const INLINE: &str = "inline";
    pub const ATTACHMENT: &str = "attachment";
}

pub mod charsets {
    pub const ISO8859_1: &str = "iso-8859-1";
    pub const ISO8859_2: &str = "iso-8859-2";
    pub const ISO8859_3: &str = "iso-8859-3";
    pub const ISO8859_4: &str = "iso-8859-4";
    pub const ISO8859_5: &str = "iso-8859-5";
    pub const ISO8859_6: &str = "iso-8859-6";
    pub const ISO8859_7: &str = "iso-8859-7";
    pub const ISO8859_8: &str = "iso-8859-8";
    pub const ISO8859_9: &str = "iso-8859-9";
    pub const ISO8859_10: &str = "iso-8859-10";
    pub const ISO8859_13: &str = "iso-8859-13";
    pub const ISO8859_14: &str = "iso-8859-14";
    pub const ISO8859_15: &str = "iso-8859-15";
    pub const ISO8859_16: &str = "iso-8859-16";

    pub const CP_437: &str = "cp-437";
    pub const CP_737: &str = "cp-737";
    pub const CP_775: &str = "cp-775";
    pub const CP_850: &str = "cp-850";
    pub const CP_852: &str = "cp-852";
    pub const CP_853: &str = "cp-853";
    pub const CP_855: &str = "cp-855";
    pub const CP_857: &str = "cp-857";
    pub const CP_858: &str = "cp-858";
    pub const CP_860: &str = "cp-860";
    pub const CP_861: &str = "cp-861";
    pub const CP_862: &str = "cp-862";
    pub const CP_863: &str = "cp-863";
    pub const CP_864: &str = "cp-864";
    pub const CP_865: &str = "cp-865";
    pub const CP_866: &str = "cp-866";
    pub const CP_869: &str = "cp-869";
    pub const CP_874: &str = "cp-874";
    pub const CP_1125: &str = "cp-1125";
    pub const CP_1250: &str = "cp-1250";
    pub const CP_1251: &str = "cp-1251";
    pub const CP_1252: &str = "cp-1252";
    pub const CP_1253: &str = "cp-1253";
    pub const CP_1254: &str = "cp-1254";
    pub const CP_1255: &str = "cp-1255";
    pub const CP_1256: &str = "cp-1256";
    pub const CP_1257: &str = "cp-1257";

    pub const US_ASCII: &str = "us-ascii";

    pub const UTF_7: &str = "utf-7";
    pub const UTF_8: &str = "utf-8";
    pub const UTF_16: &str = "utf-16";
    pub const UTF_32: &str = "utf-32";

    pub const WINDOWS_1250: &str = "windows-1250";
    pub const WINDOWS_1251: &str = "windows-1251";
    pub const WINDOWS_1252: &str = "windows-1252";
    pub const WINDOWS_1253: &str = "windows-1253";
    pub const WINDOWS_1254: &str = "windows-1254";
    pub const WINDOWS_1255: &str = "windows-1255";
    pub const WINDOWS_1256: &str = "windows-1256";
    pub const WINDOWS_1257: &str = "windows-1257";
    pub const WINDOWS_1258: &str = "windows-1258";
}

pub mod fields {
    pub const RECEIVED: &str = "Received";
    pub const FROM: &str = "From";
    pub const SENDER: &str = "Sender";
    pub const REPLY_TO: &str = "Reply-To";
    pub const TO: &str = "To";
    pub const CC: &str = "Cc";
    pub const BCC: &str = "Bcc";
    pub const DATE: &str = "Date";
    pub const SUBJECT: &str = "Subject";
    pub const ORGANIZATION: &str = "Organization";
    pub const USER_AGENT: &str = "User-Agent";
    pub const DELIVERED_TO: &str = "Delivered-To";
    pub const RETURN_PATH: &str = "Return-Path";
    pub const MIME_VERSION: &str = "Mime-Version";
    pub const MESSAGE_ID: &str = "Message-Id";
    pub const IN_REPLY_TO: &str = "In-Reply-To";
    pub const REFERENCES: &str = "References";
    pub const CONTENT_TYPE: &str = "Content-Type";
    pub const CONTENT_TRANSFER_ENCODING: &str = "Content-Transfer-Encoding";
    pub const CONTENT_DESCRIPTION: &str = "Content-Description";
    pub const CONTENT_DISPOSITION: &str = "Content-Disposition";
    pub const CONTENT_ID: &str = "Content-Id";
    pub const CONTENT_LOCATION: &str = "Content-Location";

    pub const X_MAILER: &str = "X-Mailer";
    pub const X_PRIORITY: &str = "X-Priority";
}
