//! Mail transport
//!
//! [`SendMail`] is the seam the notifier sends through. [`SmtpMailer`] is a
//! minimal plain-SMTP client: one connection per message, no auth, no TLS.

use async_trait::async_trait;
use log::{debug, warn};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::time::timeout;

use crate::core::constants::defaults;
use crate::core::error::{CheckerError, Result};

#[async_trait]
pub trait SendMail: Send + Sync {
    async fn send(
        &self,
        server: &str,
        recipients: &[String],
        sender: &str,
        body: &str,
        subject: &str,
    ) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct SmtpMailer {
    step_timeout: Duration,
    helo_name: String,
}

impl Default for SmtpMailer {
    fn default() -> Self {
        Self::new(Duration::from_secs(defaults::SMTP_TIMEOUT_SECONDS))
    }
}

impl SmtpMailer {
    pub fn new(step_timeout: Duration) -> Self {
        Self {
            step_timeout,
            helo_name: "localhost".to_string(),
        }
    }
}

#[async_trait]
impl SendMail for SmtpMailer {
    async fn send(
        &self,
        server: &str,
        recipients: &[String],
        sender: &str,
        body: &str,
        subject: &str,
    ) -> Result<()> {
        if recipients.is_empty() {
            return Err(CheckerError::Mail("no recipients".to_string()));
        }

        let address = smtp_address(server);
        debug!("connecting to SMTP server {address}");
        let stream = timeout(self.step_timeout, TcpStream::connect(&address))
            .await
            .map_err(|_| CheckerError::Mail(format!("timed out connecting to {address}")))?
            .map_err(|err| CheckerError::Mail(format!("couldn't connect to {address}: {err}")))?;

        let mut session = SmtpSession::new(stream, self.step_timeout);
        session.expect_reply(&[220]).await?;

        let ehlo = format!("EHLO {}", self.helo_name);
        if session.command(&ehlo, &[250]).await.is_err() {
            session
                .command(&format!("HELO {}", self.helo_name), &[250])
                .await?;
        }

        session
            .command(&format!("MAIL FROM:<{sender}>"), &[250])
            .await?;

        // Deliver to whoever is accepted; fail only when nobody is
        let mut accepted = 0;
        let mut last_refusal = String::new();
        for recipient in recipients {
            let (code, reply) = session.exchange(&format!("RCPT TO:<{recipient}>")).await?;
            if matches!(code, 250 | 251) {
                accepted += 1;
            } else {
                warn!("SMTP server refused recipient {recipient}: '{reply}'");
                last_refusal = reply;
            }
        }
        if accepted == 0 {
            if let Err(err) = session.command("QUIT", &[221]).await {
                debug!("QUIT not acknowledged: {err}");
            }
            return Err(CheckerError::Mail(format!(
                "every recipient was refused, last reply '{last_refusal}'"
            )));
        }

        session.command("DATA", &[354]).await?;

        let date = chrono::Local::now().to_rfc2822();
        let message = compose_message(sender, recipients, subject, body, &date);
        session.write_raw(&message).await?;
        session.command(".", &[250]).await?;

        // The message is accepted at this point
        if let Err(err) = session.command("QUIT", &[221]).await {
            debug!("QUIT not acknowledged: {err}");
        }
        Ok(())
    }
}

struct SmtpSession {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    step_timeout: Duration,
}

impl SmtpSession {
    fn new(stream: TcpStream, step_timeout: Duration) -> Self {
        let (read, writer) = stream.into_split();
        Self {
            reader: BufReader::new(read),
            writer,
            step_timeout,
        }
    }

    async fn command(&mut self, line: &str, accepted: &[u16]) -> Result<u16> {
        self.write_raw(&format!("{line}\r\n")).await?;
        self.expect_reply(accepted).await
    }

    /// Send one command and return the reply whatever its code.
    async fn exchange(&mut self, line: &str) -> Result<(u16, String)> {
        self.write_raw(&format!("{line}\r\n")).await?;
        self.read_reply().await
    }

    async fn write_raw(&mut self, data: &str) -> Result<()> {
        timeout(self.step_timeout, self.writer.write_all(data.as_bytes()))
            .await
            .map_err(|_| CheckerError::Mail("timed out writing to SMTP server".to_string()))??;
        Ok(())
    }

    async fn expect_reply(&mut self, accepted: &[u16]) -> Result<u16> {
        let (code, reply) = self.read_reply().await?;
        if accepted.contains(&code) {
            return Ok(code);
        }
        Err(CheckerError::Mail(format!("SMTP server replied '{reply}'")))
    }

    /// Read a possibly multi-line reply; returns its code and last line.
    async fn read_reply(&mut self) -> Result<(u16, String)> {
        loop {
            let mut line = String::new();
            let read = timeout(self.step_timeout, self.reader.read_line(&mut line))
                .await
                .map_err(|_| {
                    CheckerError::Mail("timed out waiting for SMTP reply".to_string())
                })??;
            if read == 0 {
                return Err(CheckerError::Mail(
                    "SMTP server closed the connection".to_string(),
                ));
            }

            let line = line.trim_end();
            let code = line
                .get(..3)
                .and_then(|c| c.parse::<u16>().ok())
                .ok_or_else(|| CheckerError::Mail(format!("malformed SMTP reply '{line}'")))?;

            // "250-..." continues, "250 ..." ends the reply
            if line.as_bytes().get(3) == Some(&b'-') {
                continue;
            }
            return Ok((code, line.to_string()));
        }
    }
}

/// `host` gets the default SMTP port, `host:port` is used as is.
///
/// IPv6 literals take a port only in brackets (`[::1]:2525`); a bare
/// literal such as `::1` is bracketed and gets the default port.
pub fn smtp_address(server: &str) -> String {
    let port = defaults::SMTP_PORT;
    if let Some(rest) = server.strip_prefix('[') {
        return match rest.split_once(']') {
            Some((_, "")) => format!("{server}:{port}"),
            _ => server.to_string(),
        };
    }

    match server.matches(':').count() {
        0 => format!("{server}:{port}"),
        1 => match server.split_once(':') {
            Some((host, p)) if !host.is_empty() && p.parse::<u16>().is_ok() => {
                server.to_string()
            }
            _ => format!("{server}:{port}"),
        },
        _ => format!("[{server}]:{port}"),
    }
}

/// Build the DATA payload, dot-stuffed and CRLF-terminated, without the
/// final `.` line.
pub fn compose_message(
    sender: &str,
    recipients: &[String],
    subject: &str,
    body: &str,
    date: &str,
) -> String {
    let mut message = String::new();
    message.push_str(&format!("From: {sender}\r\n"));
    message.push_str(&format!("To: {}\r\n", recipients.join(", ")));
    message.push_str(&format!("Subject: {}\r\n", encode_header(subject)));
    message.push_str(&format!("Date: {date}\r\n"));
    message.push_str("MIME-Version: 1.0\r\n");
    message.push_str("Content-Type: text/plain; charset=utf-8\r\n");
    message.push_str("Content-Transfer-Encoding: 8bit\r\n");
    message.push_str("\r\n");

    for line in body.lines() {
        if line.starts_with('.') {
            message.push('.');
        }
        message.push_str(line);
        message.push_str("\r\n");
    }
    message
}

/// Longest payload put into one encoded word, keeping each under 75 chars.
const ENCODED_WORD_PAYLOAD: usize = 60;

/// RFC 2047 Q-encoding for header values that are not plain ASCII.
pub fn encode_header(value: &str) -> String {
    if value.is_ascii() {
        return value.to_string();
    }

    let mut words = Vec::new();
    let mut current = String::new();
    for ch in value.chars() {
        let piece = q_encode_char(ch);
        if current.len() + piece.len() > ENCODED_WORD_PAYLOAD {
            words.push(std::mem::take(&mut current));
        }
        current.push_str(&piece);
    }
    if !current.is_empty() {
        words.push(current);
    }

    words
        .iter()
        .map(|word| format!("=?utf-8?q?{word}?="))
        .collect::<Vec<_>>()
        .join("\r\n ")
}

fn q_encode_char(ch: char) -> String {
    match ch {
        ' ' => "_".to_string(),
        c if c.is_ascii_alphanumeric() || "!*+-/".contains(c) => c.to_string(),
        c => {
            let mut buf = [0u8; 4];
            c.encode_utf8(&mut buf)
                .bytes()
                .map(|b| format!("={b:02X}"))
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    type TestResult = std::result::Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn test_smtp_address() {
        assert_eq!(smtp_address("mail.example.org"), "mail.example.org:25");
        assert_eq!(smtp_address("mail.example.org:2525"), "mail.example.org:2525");
        assert_eq!(smtp_address("127.0.0.1:1"), "127.0.0.1:1");
        assert_eq!(smtp_address("host:notaport"), "host:notaport:25");
    }

    #[test]
    fn test_smtp_address__ipv6() {
        assert_eq!(smtp_address("::1"), "[::1]:25");
        assert_eq!(smtp_address("2001:db8::25"), "[2001:db8::25]:25");
        assert_eq!(smtp_address("[::1]"), "[::1]:25");
        assert_eq!(smtp_address("[::1]:2525"), "[::1]:2525");
    }

    #[test]
    fn test_encode_header__ascii_passes_through() {
        assert_eq!(encode_header("[urlchecker Bib] ill-formed URL"), "[urlchecker Bib] ill-formed URL");
    }

    #[test]
    fn test_encode_header__non_ascii() {
        let encoded = encode_header("nicht unterstütztes");
        assert_eq!(encoded, "=?utf-8?q?nicht_unterst=C3=BCtztes?=");
    }

    #[test]
    fn test_encode_header__long_value_is_folded() {
        let encoded =
            encode_header("[urlchecker Portfolio] unsupported HTTP protocol (nicht unterstütztes Protokoll)");
        for word in encoded.split("\r\n ") {
            assert!(word.starts_with("=?utf-8?q?") && word.ends_with("?="));
            assert!(word.len() <= 75, "encoded word too long: {word}");
        }
        assert!(encoded.contains("\r\n "));
    }

    #[test]
    fn test_compose_message__headers_and_dot_stuffing() {
        let message = compose_message(
            "checker@example.org",
            &["a@example.org".to_string(), "b@example.org".to_string()],
            "[urlchecker Bib] system error",
            "http://a.test mms_id: 1\n.hidden mms_id: 2\n",
            "Thu, 15 Oct 2026 10:00:00 +0000",
        );

        assert!(message.starts_with("From: checker@example.org\r\n"));
        assert!(message.contains("To: a@example.org, b@example.org\r\n"));
        assert!(message.contains("Subject: [urlchecker Bib] system error\r\n"));
        assert!(message.contains("Date: Thu, 15 Oct 2026 10:00:00 +0000\r\n"));
        assert!(message.contains("\r\n\r\nhttp://a.test mms_id: 1\r\n..hidden mms_id: 2\r\n"));
    }

    /// Accepts one session, answers every command and returns what it read.
    async fn fake_smtp_server(listener: TcpListener) -> std::io::Result<String> {
        let (stream, _) = listener.accept().await?;
        let (read, mut write) = stream.into_split();
        let mut reader = BufReader::new(read);
        let mut transcript = String::new();
        let mut in_data = false;

        write.write_all(b"220 fake ESMTP\r\n").await?;
        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).await? == 0 {
                break;
            }
            transcript.push_str(&line);

            if in_data {
                if line == ".\r\n" {
                    in_data = false;
                    write.write_all(b"250 queued\r\n").await?;
                }
                continue;
            }

            let reply: &[u8] = match line.trim_end() {
                l if l.starts_with("EHLO") => b"250-fake\r\n250 8BITMIME\r\n",
                l if l.starts_with("RCPT TO:<typo@") => b"550 no such user\r\n",
                "DATA" => {
                    in_data = true;
                    b"354 go ahead\r\n"
                }
                "QUIT" => {
                    write.write_all(b"221 bye\r\n").await?;
                    break;
                }
                _ => b"250 ok\r\n",
            };
            write.write_all(reply).await?;
        }

        let mut rest = String::new();
        reader.read_to_string(&mut rest).await?;
        Ok(transcript)
    }

    #[tokio::test]
    async fn test_send__full_session() -> TestResult {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let address = listener.local_addr()?.to_string();
        let server = tokio::spawn(fake_smtp_server(listener));

        SmtpMailer::default()
            .send(
                &address,
                &["a@example.org".to_string(), "b@example.org".to_string()],
                "checker@example.org",
                "http://example.org/x mms_id: 123\n",
                "[urlchecker Bibliographic] URL not found (nicht gefunden)",
            )
            .await?;

        let transcript = server.await??;
        assert!(transcript.starts_with("EHLO localhost\r\n"));
        assert!(transcript.contains("MAIL FROM:<checker@example.org>\r\n"));
        assert!(transcript.contains("RCPT TO:<a@example.org>\r\nRCPT TO:<b@example.org>\r\n"));
        assert!(transcript.contains("http://example.org/x mms_id: 123\r\n.\r\n"));
        assert!(transcript.ends_with("QUIT\r\n"));
        Ok(())
    }

    #[tokio::test]
    async fn test_send__connection_refused() {
        let result = SmtpMailer::new(Duration::from_secs(2))
            .send("127.0.0.1:1", &["a@example.org".to_string()], "from@example.org", "body", "subject")
            .await;
        assert!(matches!(result, Err(CheckerError::Mail(_))));
    }

    #[tokio::test]
    async fn test_send__refused_recipient_does_not_block_the_others() -> TestResult {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let address = listener.local_addr()?.to_string();
        let server = tokio::spawn(fake_smtp_server(listener));

        SmtpMailer::default()
            .send(
                &address,
                &["typo@example.org".to_string(), "good@example.org".to_string()],
                "checker@example.org",
                "http://example.org/x mms_id: 123\n",
                "[urlchecker Portfolio] URL not found",
            )
            .await?;

        let transcript = server.await??;
        assert!(transcript.contains("RCPT TO:<typo@example.org>\r\nRCPT TO:<good@example.org>\r\nDATA\r\n"));
        assert!(transcript.contains("http://example.org/x mms_id: 123\r\n.\r\n"));
        Ok(())
    }

    #[tokio::test]
    async fn test_send__every_recipient_refused() -> TestResult {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let address = listener.local_addr()?.to_string();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await?;
            stream.write_all(b"220 hi\r\n").await?;
            let mut buf = [0u8; 512];
            let _ = stream.read(&mut buf).await?;
            stream.write_all(b"250 hello\r\n").await?;
            let _ = stream.read(&mut buf).await?;
            stream.write_all(b"250 sender ok\r\n").await?;
            let _ = stream.read(&mut buf).await?;
            stream.write_all(b"550 no such user\r\n").await?;
            Ok::<_, std::io::Error>(())
        });

        let result = SmtpMailer::default()
            .send(&address, &["nobody@example.org".to_string()], "f@example.org", "b", "s")
            .await;

        match result {
            Err(CheckerError::Mail(msg)) => assert!(msg.contains("550")),
            other => panic!("expected mail error, got {other:?}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_send__no_recipients() {
        let result = SmtpMailer::default()
            .send("127.0.0.1:1", &[], "f@example.org", "b", "s")
            .await;
        assert!(matches!(result, Err(CheckerError::Mail(_))));
    }
}
