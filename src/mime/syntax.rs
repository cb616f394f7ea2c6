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

//! Grammar for structured header field bodies.
//!
//! Most of this comes straight from RFC 2822 (including the obsolete syntax,
//! since we need to understand what others send us), plus the `token` and
//! `parameter` productions of RFC 2045. Bytes above 0x7F are accepted
//! wherever text is, since plenty of agents put raw UTF-8 in headers.
//!
//! Everything here operates on complete input; there is no streaming.

use chrono::prelude::*;
use nom::branch::alt;
use nom::bytes::complete::{
    is_a, is_not, tag_no_case, take, take_while1, take_while_m_n,
};
use nom::character::complete::char;
use nom::combinator::{map, opt, recognize, value};
use nom::multi::{
    fold_many0, many0, many0_count, many1_count, separated_nonempty_list,
};
use nom::sequence::{delimited, pair, preceded, terminated, tuple};
use nom::IResult;

use super::address::{Address, EmailAddress, Mailbox, MailboxGroup};
use super::media_type::MediaType;
use super::message_id::MessageId;
use super::text::{decode_phrase, PhraseWord, Text};

type PResult<'a, T> = IResult<&'a [u8], T>;

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn is_digit(b: u8) -> bool {
    b.is_ascii_digit()
}

fn digits(s: &[u8]) -> u32 {
    s.iter().fold(0, |accum, &d| accum * 10 + u32::from(d - b'0'))
}

// RFC 2822 3.2.1 quoted-pair
fn quoted_pair(i: &[u8]) -> PResult<&[u8]> {
    preceded(char('\\'), take(1usize))(i)
}

// RFC 2822 3.2.3 Folding white space and comments
fn fws(i: &[u8]) -> PResult<()> {
    value((), is_a(" \t\r\n"))(i)
}

fn ctext(i: &[u8]) -> PResult<&[u8]> {
    is_not("()\\ \t\r\n")(i)
}

fn ccontent(i: &[u8]) -> PResult<()> {
    alt((value((), ctext), value((), quoted_pair), fws, comment))(i)
}

fn comment(i: &[u8]) -> PResult<()> {
    value((), delimited(char('('), many0_count(ccontent), char(')')))(i)
}

/// Any amount of folding white space and comments, including none at all.
pub(crate) fn cfws(i: &[u8]) -> PResult<()> {
    value((), many0_count(alt((fws, comment))))(i)
}

// RFC 2822 3.2.4 Atom
fn is_atext(ch: u8) -> bool {
    is_ascii_atext(ch) || ch >= 0x80
}

pub(crate) fn is_ascii_atext(ch: u8) -> bool {
    ch.is_ascii_alphanumeric() || b"!#$%&'*+-/=?^_`{|}~".contains(&ch)
}

fn atext(i: &[u8]) -> PResult<&[u8]> {
    take_while1(is_atext)(i)
}

fn atom(i: &[u8]) -> PResult<&[u8]> {
    delimited(cfws, atext, cfws)(i)
}

fn dot_atom_text(i: &[u8]) -> PResult<&[u8]> {
    recognize(separated_nonempty_list(char('.'), atext))(i)
}

// RFC 2822 3.2.5 Quoted strings
fn qtext(i: &[u8]) -> PResult<&[u8]> {
    is_not(" \t\r\n\\\"")(i)
}

fn qcontent(i: &[u8]) -> PResult<&[u8]> {
    alt((qtext, quoted_pair, is_a(" \t\r\n")))(i)
}

fn quoted_string(i: &[u8]) -> PResult<Vec<u8>> {
    delimited(
        pair(cfws, char('"')),
        fold_many0(qcontent, Vec::new(), |mut accum: Vec<u8>, item| {
            // Line breaks inside quoted strings are folding, not content
            accum.extend(
                item.iter().copied().filter(|&b| b'\r' != b && b'\n' != b),
            );
            accum
        }),
        pair(char('"'), cfws),
    )(i)
}

// RFC 2822 3.2.6 Miscellaneous tokens
fn word(i: &[u8]) -> PResult<PhraseWord<'_>> {
    alt((map(atom, PhraseWord::Atom), map(quoted_string, PhraseWord::Quoted)))(
        i,
    )
}

fn word_bytes(i: &[u8]) -> PResult<Vec<u8>> {
    alt((map(atom, <[u8]>::to_vec), quoted_string))(i)
}

fn obs_dot(i: &[u8]) -> PResult<PhraseWord<'_>> {
    value(PhraseWord::Dot, terminated(char('.'), cfws))(i)
}

fn phrase(i: &[u8]) -> PResult<String> {
    map(pair(word, many0(alt((word, obs_dot)))), |(head, tail)| {
        let mut words = Vec::with_capacity(tail.len() + 1);
        words.push(head);
        words.extend(tail);
        decode_phrase(words)
    })(i)
}

// RFC 2822 3.3 Date and Time Specification
fn year(i: &[u8]) -> PResult<i32> {
    map(take_while_m_n(2, 4, is_digit), |s: &[u8]| {
        let year = digits(s) as i32;
        // RFC 2822 4.3 obsolete two- and three-digit years
        match s.len() {
            2 if year < 50 => year + 2000,
            2 | 3 => year + 1900,
            _ => year,
        }
    })(i)
}

fn month(i: &[u8]) -> PResult<u32> {
    alt((
        value(1, tag_no_case("jan")),
        value(2, tag_no_case("feb")),
        value(3, tag_no_case("mar")),
        value(4, tag_no_case("apr")),
        value(5, tag_no_case("may")),
        value(6, tag_no_case("jun")),
        value(7, tag_no_case("jul")),
        value(8, tag_no_case("aug")),
        value(9, tag_no_case("sep")),
        value(10, tag_no_case("oct")),
        value(11, tag_no_case("nov")),
        value(12, tag_no_case("dec")),
    ))(i)
}

fn one_or_two_digits(i: &[u8]) -> PResult<u32> {
    map(take_while_m_n(1, 2, is_digit), digits)(i)
}

fn date(i: &[u8]) -> PResult<(i32, u32, u32)> {
    map(
        tuple((
            terminated(one_or_two_digits, cfws),
            terminated(month, cfws),
            terminated(year, cfws),
        )),
        |(day, month, year)| (year, month, day),
    )(i)
}

fn time_of_day(i: &[u8]) -> PResult<(u32, u32, u32)> {
    let colon = || tuple((cfws, char(':'), cfws));
    map(
        tuple((
            one_or_two_digits,
            preceded(colon(), one_or_two_digits),
            opt(preceded(colon(), one_or_two_digits)),
        )),
        |(h, m, s)| (h, m, s.unwrap_or(0)),
    )(i)
}

fn numeric_zone(i: &[u8]) -> PResult<i32> {
    map(
        pair(alt((char('+'), char('-'))), take_while_m_n(4, 4, is_digit)),
        |(sign, hhmm)| {
            let hhmm = digits(hhmm) as i32;
            let seconds = hhmm / 100 * 3600 + hhmm % 100 * 60;
            if '-' == sign {
                -seconds
            } else {
                seconds
            }
        },
    )(i)
}

fn zone(i: &[u8]) -> PResult<i32> {
    const HOUR: i32 = 3600;
    alt((
        numeric_zone,
        // RFC 2822 4.3 obsolete zones
        value(0, tag_no_case("utc")),
        value(0, tag_no_case("ut")),
        value(0, tag_no_case("gmt")),
        value(-4 * HOUR, tag_no_case("edt")),
        value(-5 * HOUR, tag_no_case("est")),
        value(-5 * HOUR, tag_no_case("cdt")),
        value(-6 * HOUR, tag_no_case("cst")),
        value(-6 * HOUR, tag_no_case("mdt")),
        value(-7 * HOUR, tag_no_case("mst")),
        value(-7 * HOUR, tag_no_case("pdt")),
        value(-8 * HOUR, tag_no_case("pst")),
        // Military zones are too often wrong to be believed; RFC 2822 says
        // to treat them as -0000.
        value(0, atext),
    ))(i)
}

/// Parses an RFC 2822 `date-time`.
///
/// The day of week is optional and ignored. Returns `None` if the syntax is
/// fine but the values don't denote an actual time.
fn date_time(i: &[u8]) -> PResult<Option<DateTime<FixedOffset>>> {
    map(
        preceded(
            pair(cfws, opt(tuple((atext, cfws, char(','), cfws)))),
            tuple((date, time_of_day, preceded(cfws, zone), cfws)),
        ),
        |((year, month, day), (hour, minute, second), zone, _)| {
            FixedOffset::east_opt(zone).and_then(|offset| {
                offset
                    .with_ymd_and_hms(year, month, day, hour, minute, second)
                    .single()
            })
        },
    )(i)
}

pub(crate) fn parse_date_time(i: &[u8]) -> Option<DateTime<FixedOffset>> {
    date_time(i).ok().and_then(|(_, dt)| dt)
}

// RFC 2822 3.4.1 Addr-spec specification
fn local_part(i: &[u8]) -> PResult<String> {
    map(separated_nonempty_list(char('.'), word_bytes), |words| {
        lossy(&words.join(&b'.'))
    })(i)
}

fn domain_literal(i: &[u8]) -> PResult<String> {
    delimited(
        cfws,
        map(
            recognize(tuple((
                char('['),
                many0_count(alt((
                    value((), is_not("[]\\ \t\r\n")),
                    value((), quoted_pair),
                    fws,
                ))),
                char(']'),
            ))),
            lossy,
        ),
        cfws,
    )(i)
}

fn obs_domain(i: &[u8]) -> PResult<String> {
    map(separated_nonempty_list(char('.'), atom), |atoms| {
        lossy(&atoms.join(&b'.'))
    })(i)
}

fn domain(i: &[u8]) -> PResult<String> {
    alt((obs_domain, domain_literal))(i)
}

fn addr_spec(i: &[u8]) -> PResult<EmailAddress> {
    map(
        pair(local_part, preceded(char('@'), domain)),
        |(local, domain)| EmailAddress::new(local, domain),
    )(i)
}

// RFC 2822 4.4 obsolete source routes, which are discarded
fn obs_route(i: &[u8]) -> PResult<()> {
    value(
        (),
        tuple((
            many0_count(alt((value((), is_a(" \t\r\n,")), comment))),
            char('@'),
            domain,
            many0_count(tuple((
                char(','),
                cfws,
                opt(preceded(char('@'), domain)),
            ))),
            char(':'),
        )),
    )(i)
}

fn angle_addr(i: &[u8]) -> PResult<EmailAddress> {
    delimited(
        tuple((cfws, char('<'), opt(obs_route))),
        addr_spec,
        pair(char('>'), cfws),
    )(i)
}

// RFC 2822 3.4 Address specification
pub(crate) fn mailbox(i: &[u8]) -> PResult<Mailbox> {
    alt((
        map(pair(opt(phrase), angle_addr), |(name, email)| {
            Mailbox::new(Text::from(name.unwrap_or_default()), email)
        }),
        map(addr_spec, Mailbox::from_email),
    ))(i)
}

fn list_delim(i: &[u8]) -> PResult<()> {
    value((), many1_count(tuple((cfws, char(','), cfws))))(i)
}

fn mailbox_list(i: &[u8]) -> PResult<Vec<Mailbox>> {
    delimited(
        opt(list_delim),
        separated_nonempty_list(list_delim, mailbox),
        opt(list_delim),
    )(i)
}

fn group(i: &[u8]) -> PResult<MailboxGroup> {
    map(
        tuple((phrase, char(':'), opt(mailbox_list), cfws, char(';'), cfws)),
        |(name, _, mailboxes, _, _, _)| {
            MailboxGroup::new(Text::from(name), mailboxes.unwrap_or_default())
        },
    )(i)
}

pub(crate) fn address(i: &[u8]) -> PResult<Address> {
    alt((map(group, Address::Group), map(mailbox, Address::Mailbox)))(i)
}

/// Skips white space and comments.
pub(crate) fn skip_cfws(i: &[u8]) -> &[u8] {
    cfws(i).map(|(rest, _)| rest).unwrap_or(i)
}

/// Skips white space, comments and list delimiters.
pub(crate) fn skip_separators(i: &[u8]) -> &[u8] {
    many0_count::<_, _, (&[u8], nom::error::ErrorKind), _>(alt((
        fws,
        comment,
        value((), char(',')),
    )))(i)
    .map(|(rest, _)| rest)
    .unwrap_or(i)
}

/// Returns the offset just past the next `delim` in `i` which is not inside
/// a quoted string, or the length of `i` if there is none.
pub(crate) fn skip_past(i: &[u8], delim: u8) -> usize {
    let mut in_quotes = false;
    let mut escaped = false;
    for (ix, &b) in i.iter().enumerate() {
        if escaped {
            escaped = false;
        } else if b'\\' == b {
            escaped = true;
        } else if b'"' == b {
            in_quotes = !in_quotes;
        } else if delim == b && !in_quotes {
            return ix + 1;
        }
    }

    i.len()
}

// RFC 2822 3.6.4 Identification fields, made lenient: the right-hand side
// may be absent, and both sides may contain nearly anything.
pub(crate) fn msg_id(i: &[u8]) -> PResult<MessageId> {
    map(
        delimited(
            pair(cfws, char('<')),
            pair(
                is_not("@<> \t\r\n"),
                opt(preceded(char('@'), opt(is_not("<> \t\r\n")))),
            ),
            pair(char('>'), cfws),
        ),
        |(left, right)| {
            MessageId::new(lossy(left), right.flatten().map(lossy))
        },
    )(i)
}

// RFC 2045 5.1
pub(crate) fn is_token_char(ch: u8) -> bool {
    (b'!'..=b'~').contains(&ch) && !b"()<>@,;:\\\"/[]?=".contains(&ch)
}

fn token(i: &[u8]) -> PResult<&[u8]> {
    take_while1(is_token_char)(i)
}

/// Parses a `type/subtype` pair. A missing subtype is tolerated.
pub(crate) fn media_type(i: &[u8]) -> PResult<MediaType> {
    map(
        delimited(
            cfws,
            pair(
                token,
                opt(preceded(tuple((cfws, char('/'), cfws)), token)),
            ),
            cfws,
        ),
        |(typ, subtype)| {
            MediaType::new(&lossy(typ), &subtype.map(lossy).unwrap_or_default())
        },
    )(i)
}

/// Parses a bare token, such as a disposition type or transfer encoding.
pub(crate) fn bare_token(i: &[u8]) -> PResult<String> {
    delimited(cfws, map(token, lossy), cfws)(i)
}

/// Parses one `attribute=value` parameter.
///
/// Unquoted values may contain anything up to the next delimiter, since
/// unquoted file names full of tspecials are common.
pub(crate) fn parameter(i: &[u8]) -> PResult<(String, String)> {
    map(
        tuple((
            cfws,
            token,
            cfws,
            char('='),
            alt((quoted_string, map(is_not("; \t\r\n\""), <[u8]>::to_vec))),
            cfws,
        )),
        |(_, attribute, _, _, value, _)| (lossy(attribute), lossy(&value)),
    )(i)
}

/// Splits a `Received` clause list into its words, dropping comments.
pub(crate) fn relay_words(i: &[u8]) -> Vec<String> {
    many0::<_, _, (&[u8], nom::error::ErrorKind), _>(preceded(
        cfws,
        map(is_not(" \t\r\n("), lossy),
    ))(i)
    .map(|(_, words)| words)
    .unwrap_or_default()
}

#[cfg(test)]
mod test {
    use super::*;

    fn mb(name: &str, local: &str, domain: &str) -> Mailbox {
        Mailbox::new(Text::from(name), EmailAddress::new(local, domain))
    }

    #[test]
    fn parse_comments_and_whitespace() {
        assert_eq!(b"x", &cfws(b" (a (nested) \\) comment)\r\n\tx").unwrap().0[..]);
        assert_eq!(b"x", &cfws(b"x").unwrap().0[..]);
    }

    #[test]
    fn parse_mailboxes() {
        assert_eq!(
            mb("", "foo", "bar.com"),
            mailbox(b"foo@bar.com").unwrap().1
        );
        assert_eq!(
            mb("John Doe", "jdoe", "machine.example"),
            mailbox(b"John Doe <jdoe@machine.example>").unwrap().1
        );
        assert_eq!(
            mb("Joe Q. Public", "john.q.public", "example.com"),
            mailbox(b"\"Joe Q. Public\" <john.q.public@example.com>")
                .unwrap()
                .1
        );
        assert_eq!(
            mb("John Q. Public", "jqp", "example.com"),
            mailbox(b"John Q. Public <jqp@example.com>").unwrap().1
        );
        assert_eq!(
            mb("Pete", "pete", "silly.test"),
            mailbox(b"Pete(A wonderful \\) chap) <pete(his account)@silly.test(his host)>")
                .unwrap()
                .1
        );
        assert_eq!(
            mb("", "joe", "example.org"),
            mailbox(b"<@machine.tld,@other.tld:joe@example.org>").unwrap().1
        );
        assert_eq!(
            mb("André Pirard", "PIRARD", "vm1.ulg.ac.be"),
            mailbox(b"=?ISO-8859-1?Q?Andr=E9?= Pirard <PIRARD@vm1.ulg.ac.be>")
                .unwrap()
                .1
        );
        assert_eq!(
            mb("", "john doe", "[127.0.0.1]"),
            mailbox(b"\"john doe\"@[127.0.0.1]").unwrap().1
        );
        assert!(mailbox(b"<>").is_err());
        assert!(mailbox(b"not an address").is_err());
    }

    #[test]
    fn parse_groups() {
        assert_matches!(
            Ok((_, Address::Group(_))),
            address(b"undisclosed-recipients:;")
        );

        let (rest, group) = address(
            b"A Group:Ed Jones <c@a.test>,joe@where.test,John <jdoe@one.test>;",
        )
        .unwrap();
        assert!(rest.is_empty());
        match group {
            Address::Group(group) => {
                assert_eq!("A Group", group.name().as_str());
                assert_eq!(3, group.mailbox_count());
                assert_eq!(
                    &mb("John", "jdoe", "one.test"),
                    group.mailbox_at(2).unwrap()
                );
            }
            a => panic!("Unexpected address: {:?}", a),
        }
    }

    #[test]
    fn parse_dates() {
        fn dt(s: &str) -> String {
            parse_date_time(s.as_bytes()).unwrap().to_rfc3339()
        }

        assert_eq!("1997-11-21T09:55:06-06:00", dt("Fri, 21 Nov 1997 09:55:06 -0600"));
        assert_eq!("1997-11-21T09:55:06-06:00", dt("21 Nov 1997 09:55:06 -0600"));
        assert_eq!("1997-11-21T09:55:00+00:00", dt("Fri, 21 nov 97 09:55 GMT"));
        assert_eq!(
            "2003-07-01T10:52:37+02:00",
            dt("Tue, 1 Jul 2003 10:52:37 +0200 (CEST)")
        );
        assert_eq!("1969-02-13T23:32:00-05:00", dt("Thu,\r\n 13\r\n Feb\r\n 1969\r\n 23:32\r\n EST"));
        assert_eq!("2020-01-02T03:04:05+00:00", dt("2 Jan 20 03:04:05 Z"));
        assert_eq!(None, parse_date_time(b"31 Feb 2020 00:00:00 +0000"));
        assert_eq!(None, parse_date_time(b"yesterday"));
    }

    #[test]
    fn parse_message_ids() {
        assert_eq!(
            MessageId::new("1234", Some("local.machine.example".to_owned())),
            msg_id(b" <1234@local.machine.example> ").unwrap().1
        );
        assert_eq!(
            MessageId::new("no-domain", None),
            msg_id(b"<no-domain>").unwrap().1
        );
        assert!(msg_id(b"1234@local").is_err());
    }

    #[test]
    fn parse_media_types_and_parameters() {
        assert_eq!(
            MediaType::new("text", "plain"),
            media_type(b" Text/PLAIN ;").unwrap().1
        );
        assert_eq!(
            MediaType::new("text", ""),
            media_type(b"text").unwrap().1
        );

        assert_eq!(
            ("charset".to_owned(), "us-ascii".to_owned()),
            parameter(b" charset=us-ascii").unwrap().1
        );
        assert_eq!(
            ("name".to_owned(), "a \"b\".txt".to_owned()),
            parameter(b"name=\"a \\\"b\\\".txt\"").unwrap().1
        );
        assert_eq!(
            ("name".to_owned(), "foo/bar?.txt".to_owned()),
            parameter(b"name=foo/bar?.txt;").unwrap().1
        );
    }

    #[test]
    fn relay_word_splitting() {
        assert_eq!(
            vec!["from", "mail.example.com", "by", "mx.example.org"],
            relay_words(
                b"from mail.example.com (mail.example.com [10.0.0.1])\r\n\tby mx.example.org"
            )
        );
    }

    #[test]
    fn separator_skipping() {
        assert_eq!(b"a@b", skip_separators(b" , (x) ,a@b"));
        assert_eq!(4, skip_past(b"abc,def", b','));
        assert_eq!(8, skip_past(b"\"a,b\" c,d", b','));
        assert_eq!(3, skip_past(b"abc", b','));
    }
}
